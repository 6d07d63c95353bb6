use http::header::{COOKIE, HeaderValue};
use serde_json::Value;

use crate::identity::CompositeId;
use crate::transport::{Connection, Params, accept_language_headers};

use super::action::RelayAction;
use super::errors::RelayError;

/// Payload returned by the remote service, passed through untouched
#[derive(Debug, Clone, PartialEq)]
pub enum RelayReply {
    Json(Value),
    Text(String),
}

/// Make one call to the remote service on behalf of `identity`
///
/// `user` is always set to the identity's user. When the identity carries a
/// remote session cookie it is sent as the `Cookie` header and its value
/// segment as the `session` parameter. Anything but a `200` reply is an error.
pub async fn call_remote(
    conn: &mut Connection,
    path: &str,
    mut params: Params,
    identity: Option<&CompositeId>,
    accept_language: Option<&str>,
    as_text: bool,
) -> Result<RelayReply, RelayError> {
    let mut headers = accept_language_headers(accept_language);

    if let Some(identity) = identity {
        params.insert("user".to_string(), identity.user.clone());
        if let Some(cookie) = &identity.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| RelayError::InvalidResponse(format!("Invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
            if let Some(session) = identity.session_value() {
                params.insert("session".to_string(), session.to_string());
            }
        }
    }

    let response = conn.post(path, &params, &headers).await.map_err(|e| {
        tracing::error!("Failed to call remote service {}: {}", path, e);
        RelayError::from(e)
    })?;

    if !response.is_ok() {
        let err = RelayError::RemoteStatus {
            path: path.to_string(),
            status: response.status_code(),
            reason: response.reason().to_string(),
        };
        tracing::error!("{}", err);
        return Err(err);
    }

    if as_text {
        return Ok(RelayReply::Text(response.text().to_string()));
    }

    response.json::<Value>().map(RelayReply::Json).map_err(|e| {
        tracing::error!("Failed to decode reply of {}: {}", path, e);
        RelayError::InvalidResponse(e.to_string())
    })
}

/// Forward `action` with the caller's parameters to `/userservice/<action>`
#[tracing::instrument(skip(conn, params, identity, accept_language), fields(user = %identity.user))]
pub async fn relay(
    conn: &mut Connection,
    action: RelayAction,
    params: Params,
    identity: &CompositeId,
    accept_language: Option<&str>,
) -> Result<RelayReply, RelayError> {
    call_remote(
        conn,
        &action.path(),
        params,
        Some(identity),
        accept_language,
        action.returns_text(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsFiles;
    use crate::relay::{DEFAULT_ERROR_CODE, ErrorEnvelope};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    fn connection(server: &MockServer) -> Connection {
        Connection::with_tls(&server.base_url(), TlsFiles::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_relay_injects_user_cookie_and_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/userservice/enable")
                    .header("cookie", "userauthcookie=abc123")
                    .header("accept-language", "fr")
                    .body_contains("serial=OATH0001")
                    .body_contains("user=alice%40corp")
                    .body_contains("session=abc123");
                then.status(200)
                    .json_body(json!({"result": {"status": true, "value": {"enable token": 1}}}));
            })
            .await;

        let mut conn = connection(&server);
        let mut params = Params::new();
        params.insert("serial".to_string(), "OATH0001".to_string());
        // The local anti-forgery value is replaced by the remote session
        params.insert("session".to_string(), "local-token".to_string());

        let identity = CompositeId::parse("alice@corp;userauthcookie=abc123");
        let reply = relay(&mut conn, RelayAction::Enable, params, &identity, Some("fr"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            reply,
            RelayReply::Json(json!({"result": {"status": true, "value": {"enable token": 1}}}))
        );
    }

    #[tokio::test]
    async fn test_relay_without_cookie() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/userservice/history")
                    .body_contains("user=bob");
                then.status(200).json_body(json!({"rows": []}));
            })
            .await;

        let mut conn = connection(&server);
        relay(
            &mut conn,
            RelayAction::History,
            Params::new(),
            &CompositeId::parse("bob"),
            None,
        )
        .await
        .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_business_error_passed_through() {
        let server = MockServer::start_async().await;
        let payload = json!({
            "result": {"status": false, "error": {"code": 905, "message": "policy denied"}},
            "version": "LinOTP 2.7",
            "id": 1
        });
        let body = payload.clone();
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/userservice/setpin");
                then.status(200).json_body(body);
            })
            .await;

        let mut conn = connection(&server);
        let reply = relay(
            &mut conn,
            RelayAction::Setpin,
            Params::new(),
            &CompositeId::parse("bob"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(reply, RelayReply::Json(payload));
    }

    #[tokio::test]
    async fn test_load_form_returns_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/userservice/load_form");
                then.status(200).body("<form id=\"enroll\"></form>");
            })
            .await;

        let mut conn = connection(&server);
        let reply = relay(
            &mut conn,
            RelayAction::LoadForm,
            Params::new(),
            &CompositeId::parse("bob"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(reply, RelayReply::Text("<form id=\"enroll\"></form>".to_string()));
    }

    #[tokio::test]
    async fn test_remote_500_becomes_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/userservice/enable");
                then.status(500);
            })
            .await;

        let mut conn = connection(&server);
        let err = relay(
            &mut conn,
            RelayAction::Enable,
            Params::new(),
            &CompositeId::parse("bob"),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RelayError::RemoteStatus { status: 500, .. }));
        let envelope = ErrorEnvelope::from_error(&err);
        assert_eq!(envelope.jsonrpc, "2.0");
        assert!(!envelope.result.status);
        assert_eq!(envelope.result.error.code, DEFAULT_ERROR_CODE);
        assert!(!envelope.result.error.message.is_empty());
        assert_eq!(envelope.id, "1.0");
    }

    #[tokio::test]
    async fn test_undecodable_json_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/userservice/enable");
                then.status(200).body("not json");
            })
            .await;

        let mut conn = connection(&server);
        let err = relay(
            &mut conn,
            RelayAction::Enable,
            Params::new(),
            &CompositeId::parse("bob"),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RelayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_single_remote_call_per_relay() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/userservice/reset");
                then.status(502);
            })
            .await;

        let mut conn = connection(&server);
        let _ = relay(
            &mut conn,
            RelayAction::Reset,
            Params::new(),
            &CompositeId::parse("bob"),
            None,
        )
        .await;
        assert_eq!(mock.hits_async().await, 1);
    }
}
