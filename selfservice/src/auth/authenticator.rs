use crate::identity::CompositeId;
use crate::transport::{Connection, Params, RemoteReply, accept_language_headers, is_truthy};

use super::errors::AuthError;
use super::types::Credentials;

const AUTH_PATH: &str = "/userservice/auth";

/// Check `credentials` against the remote service
///
/// Returns `Ok(None)` when the remote service answers with a non-200 status or
/// a falsy `result.value`. On success the composite identity carries the
/// remote session cookie if one was issued. Transport failures are returned
/// as errors.
#[tracing::instrument(skip(conn, credentials), fields(login = %credentials.login))]
pub async fn authenticate(
    conn: &mut Connection,
    credentials: &Credentials,
    accept_language: Option<&str>,
) -> Result<Option<CompositeId>, AuthError> {
    let mut params = Params::new();
    params.insert("login".to_string(), credentials.login.clone());
    params.insert("password".to_string(), credentials.password.clone());

    let response = conn
        .post(AUTH_PATH, &params, &accept_language_headers(accept_language))
        .await
        .map_err(|e| {
            tracing::error!("Authentication request failed: {}", e);
            AuthError::from(e)
        })?;

    if !response.is_ok() {
        tracing::error!(
            "Failed to authenticate user {}: {} {}",
            credentials.login,
            response.status_code(),
            response.reason()
        );
        return Ok(None);
    }

    let reply: RemoteReply = response.json().map_err(|e| {
        tracing::error!("Failed to decode authentication reply: {}", e);
        AuthError::InvalidResponse(e.to_string())
    })?;

    if !is_truthy(&reply.result.value) {
        tracing::debug!("Remote service denied authentication");
        return Ok(None);
    }

    let cookie = response.cookie_pair(conn.session_cookie_name());
    if cookie.is_none() {
        tracing::debug!("No remote session cookie issued");
    }

    Ok(Some(CompositeId::new(credentials.login.clone(), cookie)))
}
