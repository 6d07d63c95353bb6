use axum::{
    Json,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
};
use axum_extra::{TypedHeader, headers};
use http::{HeaderMap, StatusCode, Uri, header::CONTENT_TYPE};

use selfservice::{Params, RelayAction, RelayReply, parse_params, relay};

use super::account::accept_language;
use super::error::{IntoResponseError, NOT_AUTHENTICATED, envelope_response, outcome_response};
use super::session::AuthUser;
use super::state::AppState;

/// Query string parameters overlaid by form body parameters
pub(crate) fn request_params(query: Option<&str>, headers: &HeaderMap, body: &str) -> Params {
    let mut params = parse_params(query.unwrap_or_default());
    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        params.extend(parse_params(body));
    }
    params
}

/// Relay a user action to the remote service
#[allow(clippy::too_many_arguments)]
pub(super) async fn action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    user: Option<AuthUser>,
    cookies: Option<TypedHeader<headers::Cookie>>,
    headers: HeaderMap,
    uri: Uri,
    RawQuery(query): RawQuery,
    body: String,
) -> Result<Response, (StatusCode, String)> {
    let action = action.parse::<RelayAction>().into_response_error()?;

    let Some(user) = user else {
        return Err((StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED.to_string()));
    };

    let params = request_params(query.as_deref(), &headers, &body);

    if action.requires_session_guard() {
        let cookie = cookies
            .as_ref()
            .and_then(|TypedHeader(c)| c.get(state.guard.cookie_name()));
        let outcome = state.guard.check(
            cookie,
            params.get("session").map(String::as_str),
            uri.path(),
        );
        if let Some(response) = outcome_response(outcome) {
            return Ok(response);
        }
    }

    let mut conn = state.connection();
    let reply = relay(
        &mut conn,
        action,
        params,
        user.composite_id(),
        accept_language(&headers),
    )
    .await;

    Ok(match reply {
        Ok(reply) => reply_response(reply)?,
        Err(e) => {
            tracing::error!("Failed to relay {}: {}", action, e);
            envelope_response(&e)
        }
    })
}

pub(crate) fn reply_response(reply: RelayReply) -> Result<Response, (StatusCode, String)> {
    match reply {
        RelayReply::Json(value) => Ok(Json(value).into_response()),
        RelayReply::Text(text) => Response::builder()
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .body(text.into())
            .into_response_error(),
    }
}
