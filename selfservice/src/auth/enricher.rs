use serde_json::Value;

use crate::identity::Identity;
use crate::transport::{Connection, Params, RemoteReply, accept_language_headers};

use super::errors::AuthError;

const USERINFO_PATH: &str = "/remoteservice/userinfo";

/// Decorate an authenticated identity with profile attributes
///
/// Binds the identity's remote session to `conn` unless a session is already
/// bound. Only a `200` reply whose `result.value` is an object changes the
/// identity; anything else leaves it as it was. Transport failures are
/// returned as errors.
pub async fn enrich(
    conn: &mut Connection,
    identity: Option<Identity>,
    accept_language: Option<&str>,
) -> Result<Option<Identity>, AuthError> {
    let Some(mut identity) = identity else {
        return Ok(None);
    };
    if identity.login.is_empty() {
        return Ok(Some(identity));
    }

    if !conn.is_user_session_set() {
        let composite = &identity.composite_id;
        conn.set_user_session(composite.session_value().unwrap_or_default(), &composite.user);
    }

    let response = conn
        .post(
            USERINFO_PATH,
            &Params::new(),
            &accept_language_headers(accept_language),
        )
        .await
        .map_err(|e| {
            tracing::error!("User info request failed: {}", e);
            AuthError::from(e)
        })?;

    if !response.is_ok() {
        tracing::warn!(
            "Failed to fetch user info for {}: {} {}",
            identity.login,
            response.status_code(),
            response.reason()
        );
        return Ok(Some(identity));
    }

    match response.json::<RemoteReply>() {
        Ok(reply) => match reply.result.value {
            Value::Object(attributes) => identity.merge_attributes(attributes),
            other => tracing::debug!("User info is not a mapping: {}", other),
        },
        Err(e) => tracing::warn!("Failed to decode user info: {}", e),
    }

    Ok(Some(identity))
}
