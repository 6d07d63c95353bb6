//! Combined router for all self-service endpoints

use axum::{Router, routing::get};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use selfservice::SelfServiceConfig;

use super::state::AppState;
use super::{account, portal, userservice};

const DEFAULT_LOGIN_FORM_PATH: &str = "/account/login";

/// Path component of the configured login form URL
fn login_form_path(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.starts_with('/') {
        path
    } else {
        DEFAULT_LOGIN_FORM_PATH
    }
}

fn routes(config: SelfServiceConfig) -> Router {
    let login_path = login_form_path(&config.login_form_url).to_string();
    let login_handler_path = config.login_handler_path.clone();
    let logout_handler_path = config.logout_handler_path.clone();

    Router::new()
        .route("/", get(portal::index))
        .route("/selfservice", get(portal::index))
        .route(
            "/selfservice/load_form",
            get(portal::load_form).post(portal::load_form),
        )
        .route("/selfservice/custom-style.css", get(portal::custom_style))
        .route(
            "/userservice/{action}",
            get(userservice::action).post(userservice::action),
        )
        .route(&login_path, get(account::login))
        .route(&login_handler_path, get(account::dologin).post(account::dologin))
        .route(&logout_handler_path, get(account::logout))
        .with_state(AppState::new(config))
}

/// Create a router for all self-service endpoints
///
/// The endpoints will be available at:
/// - `/` and `/selfservice` for the user context
/// - `/selfservice/load_form` and `/selfservice/custom-style.css`
/// - `/userservice/{action}` for the relayed actions
/// - the configured login form, login handler and logout paths
pub fn selfservice_router(config: SelfServiceConfig) -> Router {
    routes(config).layer(
        TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new()
                    .level(Level::INFO)
                    .include_headers(true),
            )
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as `selfservice_router()` but without the HTTP tracing middleware
pub fn selfservice_router_no_trace(config: SelfServiceConfig) -> Router {
    routes(config)
}
