//! Login, login form submission and logout

use axum::{
    Json,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
};
use http::{HeaderMap, HeaderValue, StatusCode, Uri, header::ACCEPT_LANGUAGE};

use selfservice::{
    ChallengeOutcome, CookieOptions, FAILURE_REASON_HEADER, LOGIN_REQUIRED_STATUS, LoginForm,
    POST_LOGIN_REDIRECT, authenticate, header_expire_cookie, header_set_cookie, pre_context,
    seal_identity,
};

use super::error::{IntoResponseError, found, outcome_response, unavailable_response};
use super::session::AuthUser;
use super::state::AppState;

pub(crate) const MISSING_CREDENTIALS: &str = "Missing login or password";
pub(crate) const LOGIN_FAILED: &str = "Login failed";

pub(crate) fn accept_language(headers: &HeaderMap) -> Option<&str> {
    headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok())
}

/// Login page context, or a redirect for an already authenticated user
pub(super) async fn login(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    if user.is_some() {
        tracing::debug!("Already authenticated, redirecting to {}", POST_LOGIN_REDIRECT);
        return found(POST_LOGIN_REDIRECT, HeaderMap::new());
    }

    let mut conn = state.connection();
    match pre_context(&mut conn, accept_language(&headers)).await {
        Ok(context) => {
            let status = StatusCode::from_u16(LOGIN_REQUIRED_STATUS).unwrap_or(StatusCode::OK);
            (status, Json(context)).into_response()
        }
        Err(e) => {
            tracing::error!("Login context lookup failed: {}", e);
            unavailable_response(&e, &uri.to_string())
        }
    }
}

/// Handle a login form submission
pub(super) async fn dologin(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: String,
) -> Result<Response, (StatusCode, String)> {
    let config = state.config();
    let form = LoginForm::new(query.as_deref().unwrap_or_default(), &body);

    let Some(credentials) = state.challenge.identify(&form) else {
        tracing::debug!("Login form submitted without credentials");
        return challenge(&state, MISSING_CREDENTIALS);
    };

    let mut conn = state.connection();
    let identity = authenticate(&mut conn, &credentials, accept_language(&headers))
        .await
        .into_response_error()?;

    let Some(composite_id) = identity else {
        tracing::info!("Authentication failed for {}", credentials.login);
        return challenge(&state, LOGIN_FAILED);
    };

    let ticket = seal_identity(&config.identity_secret, &composite_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut response_headers = HeaderMap::new();
    header_set_cookie(
        &mut response_headers,
        &config.identity_cookie,
        &ticket,
        CookieOptions::session(true, true),
    )
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    state
        .guard
        .issue(&mut response_headers, true)
        .into_response_error()?;

    tracing::info!("User {} logged in", credentials.login);
    Ok(redirect_response(state.challenge.identified(response_headers)))
}

/// Drop the identity, the remote session and the local session
pub(super) async fn logout(State(state): State<AppState>) -> Result<Response, (StatusCode, String)> {
    let mut headers = forget_headers(&state)?;
    header_expire_cookie(&mut headers, &state.config().remote_cookie_name)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    state.guard.expire(&mut headers).into_response_error()?;

    Ok(found(state.challenge.login_form_url(), headers))
}

/// Back to the login form with `reason` and the identity cookie expired
fn challenge(state: &AppState, reason: &'static str) -> Result<Response, (StatusCode, String)> {
    let mut app_headers = HeaderMap::new();
    app_headers.insert(FAILURE_REASON_HEADER, HeaderValue::from_static(reason));
    Ok(redirect_response(
        state.challenge.challenge(&app_headers, forget_headers(state)?),
    ))
}

fn redirect_response(outcome: ChallengeOutcome) -> Response {
    outcome_response(outcome).unwrap_or_else(|| {
        tracing::error!("Login produced no redirect");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn forget_headers(state: &AppState) -> Result<HeaderMap, (StatusCode, String)> {
    let mut headers = HeaderMap::new();
    header_expire_cookie(&mut headers, &state.config().identity_cookie)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(headers)
}
