use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use serde_json::Value;

use selfservice::{RelayAction, context, enrich, header_expire_cookie, relay};

use super::account::accept_language;
use super::error::{NOT_AUTHENTICATED, envelope_response};
use super::session::AuthUser;
use super::state::AppState;
use super::userservice::{reply_response, request_params};

fn not_authenticated(state: &AppState) -> Response {
    let mut headers = HeaderMap::new();
    if let Err(e) = header_expire_cookie(&mut headers, &state.config().remote_cookie_name) {
        tracing::error!("Failed to expire remote session cookie: {}", e);
    }
    (StatusCode::UNAUTHORIZED, headers, NOT_AUTHENTICATED).into_response()
}

/// Context of the authenticated user for the self-service page
///
/// The profile attributes fetched for the identity are added as `userinfo`.
pub(super) async fn index(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
) -> Response {
    let Some(user) = user else {
        return not_authenticated(&state);
    };
    let lang = accept_language(&headers);
    let mut conn = state.connection();

    let identity = match enrich(&mut conn, Some(user.identity), lang).await {
        Ok(Some(identity)) => identity,
        Ok(None) => return not_authenticated(&state),
        Err(e) => {
            tracing::error!("User info lookup failed: {}", e);
            return not_authenticated(&state);
        }
    };

    match context(&mut conn, &identity.composite_id, lang).await {
        Ok(mut context) => {
            if let Some(map) = context.as_object_mut() {
                map.insert("userinfo".to_string(), Value::Object(identity.attributes));
            }
            Json(context).into_response()
        }
        Err(e) => {
            tracing::error!("Context lookup failed: {}", e);
            not_authenticated(&state)
        }
    }
}

/// Form markup rendered by the remote service, not subject to the session guard
pub(super) async fn load_form(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    let Some(user) = user else {
        return not_authenticated(&state);
    };
    let params = request_params(query.as_deref(), &headers, &body);

    let mut conn = state.connection();
    match relay(
        &mut conn,
        RelayAction::LoadForm,
        params,
        user.composite_id(),
        accept_language(&headers),
    )
    .await
    {
        Ok(reply) => reply_response(reply).into_response(),
        Err(e) => {
            tracing::error!("Failed to load form: {}", e);
            envelope_response(&e)
        }
    }
}

/// Empty stylesheet used when no custom style is installed
pub(super) async fn custom_style() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/css")], "")
}
