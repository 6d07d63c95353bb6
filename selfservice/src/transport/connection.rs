use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use http::header::{ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderValue};

use crate::config::{DEFAULT_REMOTE_COOKIE_NAME, SelfServiceConfig, TlsFiles};

use super::errors::TransportError;
use super::response::RemoteResponse;

/// Form parameters of a remote call
pub type Params = BTreeMap<String, String>;

/// A connection to the remote service that can send requests repeatedly
///
/// The underlying [`reqwest::Client`] is created on the first request and
/// reused for the lifetime of the connection. A connection belongs to exactly
/// one request-handling context: once [`Connection::set_user_session`] has been
/// called every further call carries that user's session, so it must never be
/// shared between end users.
#[derive(Debug)]
pub struct Connection {
    base_url: String,
    tls: TlsFiles,
    timeout: Duration,
    session_cookie_name: String,
    client: Option<reqwest::Client>,
    session_params: Params,
    session_cookie: Option<String>,
    is_user_session_set: bool,
}

impl Connection {
    pub fn new(config: &SelfServiceConfig) -> Self {
        let mut conn = Self::with_tls(
            &config.remote_url,
            config.tls.clone(),
            config.request_timeout,
        );
        conn.session_cookie_name = config.remote_cookie_name.clone();
        conn
    }

    pub fn with_tls(base_url: &str, tls: TlsFiles, timeout: Duration) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            base_url,
            tls,
            timeout,
            session_cookie_name: DEFAULT_REMOTE_COOKIE_NAME.to_string(),
            client: None,
            session_params: Params::new(),
            session_cookie: None,
            is_user_session_set: false,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the session cookie issued by the remote service
    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    /// Install `session` and `user` as defaults for every later call
    ///
    /// `session` becomes both a `session` parameter and the remote session
    /// cookie; `user` becomes a `user` parameter. Empty values are skipped.
    /// Calling this again overwrites the defaults, and values passed to
    /// [`Connection::post`] always take precedence.
    pub fn set_user_session(&mut self, session: &str, user: &str) {
        if !session.is_empty() {
            self.session_params
                .insert("session".to_string(), session.to_string());
            self.session_cookie = Some(format!("{}={}", self.session_cookie_name, session));
        }
        if !user.is_empty() {
            self.session_params
                .insert("user".to_string(), user.to_string());
        }
        if !session.is_empty() || !user.is_empty() {
            self.is_user_session_set = true;
        }
    }

    pub fn is_user_session_set(&self) -> bool {
        self.is_user_session_set
    }

    /// Send a form-encoded POST request to `base_url + path`
    pub async fn post(
        &mut self,
        path: &str,
        params: &Params,
        headers: &HeaderMap,
    ) -> Result<RemoteResponse, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let mut form = self.session_params.clone();
        form.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut request_headers = headers.clone();
        if !request_headers.contains_key(COOKIE)
            && let Some(cookie) = &self.session_cookie
        {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| TransportError::Request(format!("Invalid cookie: {e}")))?;
            request_headers.insert(COOKIE, value);
        }

        let client = self.client()?.clone();

        tracing::debug!("POST {}", url);
        let response = client
            .post(&url)
            .headers(request_headers)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to {} failed: {}", url, e);
                TransportError::from(e)
            })?;

        RemoteResponse::read(response).await
    }

    fn client(&mut self) -> Result<&reqwest::Client, TransportError> {
        if self.client.is_none() {
            self.client = Some(self.build_client()?);
        }
        self.client
            .as_ref()
            .ok_or_else(|| TransportError::Request("HTTP client unavailable".to_string()))
    }

    fn build_client(&self) -> Result<reqwest::Client, TransportError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(90));

        if self.base_url.to_lowercase().starts_with("https://") {
            if let Some(server_cert) = &self.tls.server_cert {
                let pem = read_pem(server_cert)?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| TransportError::Tls(e.to_string()))?;
                builder = builder
                    .tls_built_in_root_certs(false)
                    .add_root_certificate(cert);
            }

            match (&self.tls.client_cert, &self.tls.client_key) {
                (Some(cert), Some(key)) => {
                    let mut pem = read_pem(cert)?;
                    pem.push(b'\n');
                    pem.extend(read_pem(key)?);
                    let identity = reqwest::Identity::from_pem(&pem)
                        .map_err(|e| TransportError::Tls(e.to_string()))?;
                    builder = builder.identity(identity);
                }
                (Some(_), None) | (None, Some(_)) => {
                    tracing::warn!(
                        "Client certificate and key must both be configured, ignoring the one given"
                    );
                }
                (None, None) => {}
            }
        }

        builder
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))
    }
}

/// Warning for a remote service reached over plain http, or over https
/// without any certificate configuration
pub fn transport_security_warning(base_url: &str, tls: &TlsFiles) -> Option<&'static str> {
    let is_https = base_url
        .split_once("://")
        .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("https"));
    match (is_https, tls.is_empty()) {
        (false, _) => Some("Using http is a security risk."),
        (true, true) => Some("Using https without certificates is a security risk."),
        (true, false) => None,
    }
}

/// Headers carrying the caller's `Accept-Language` through to the remote service
pub fn accept_language_headers(accept_language: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = accept_language.and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(ACCEPT_LANGUAGE, value);
    }
    headers
}

fn read_pem(path: &Path) -> Result<Vec<u8>, TransportError> {
    std::fs::read(path)
        .map_err(|e| TransportError::Tls(format!("Failed to read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::path::PathBuf;

    fn plain(url: &str) -> Connection {
        Connection::with_tls(url, TlsFiles::default(), Duration::from_secs(5))
    }

    #[test]
    fn test_set_user_session_flags() {
        let mut conn = plain("http://localhost");
        assert!(!conn.is_user_session_set());

        conn.set_user_session("", "");
        assert!(!conn.is_user_session_set());

        conn.set_user_session("", "alice");
        assert!(conn.is_user_session_set());
        assert!(conn.session_cookie.is_none());

        conn.set_user_session("s1", "alice");
        assert_eq!(conn.session_cookie.as_deref(), Some("userauthcookie=s1"));

        conn.set_user_session("s2", "bob");
        assert_eq!(conn.session_params.get("session").map(String::as_str), Some("s2"));
        assert_eq!(conn.session_params.get("user").map(String::as_str), Some("bob"));
        assert_eq!(conn.session_cookie.as_deref(), Some("userauthcookie=s2"));
    }

    #[tokio::test]
    async fn test_post_sends_form_params() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/userservice/auth")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body_contains("login=alice")
                    .body_contains("password=secret");
                then.status(200).body("{\"result\":{\"value\":true}}");
            })
            .await;

        let mut conn = plain(&server.base_url());
        let mut params = Params::new();
        params.insert("login".to_string(), "alice".to_string());
        params.insert("password".to_string(), "secret".to_string());

        let response = conn
            .post("/userservice/auth", &params, &HeaderMap::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.text(), "{\"result\":{\"value\":true}}");
    }

    #[tokio::test]
    async fn test_post_carries_user_session_defaults() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/remoteservice/userinfo")
                    .header("cookie", "userauthcookie=sess42")
                    .body_contains("session=sess42")
                    .body_contains("user=alice");
                then.status(200).body("{}");
            })
            .await;

        let mut conn = plain(&server.base_url());
        conn.set_user_session("sess42", "alice");
        conn.post("/remoteservice/userinfo", &Params::new(), &HeaderMap::new())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_per_call_values_override_defaults() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/userservice/history")
                    .header("cookie", "userauthcookie=explicit")
                    .body_contains("user=bob")
                    .body_contains("session=sess42");
                then.status(200).body("{}");
            })
            .await;

        let mut conn = plain(&server.base_url());
        conn.set_user_session("sess42", "alice");

        let mut params = Params::new();
        params.insert("user".to_string(), "bob".to_string());
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("userauthcookie=explicit"));

        conn.post("/userservice/history", &params, &headers)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_is_reused() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).body("{}");
            })
            .await;

        let mut conn = plain(&server.base_url());
        assert!(conn.client.is_none());
        conn.post("/a", &Params::new(), &HeaderMap::new()).await.unwrap();
        assert!(conn.client.is_some());
        conn.post("/b", &Params::new(), &HeaderMap::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) is not expected to accept HTTP connections
        let mut conn = plain("http://127.0.0.1:9");
        let result = conn
            .post("/userservice/auth", &Params::new(), &HeaderMap::new())
            .await;
        assert!(matches!(result, Err(TransportError::Request(_))));
    }

    #[test]
    fn test_missing_server_cert_is_tls_error() {
        let conn = Connection::with_tls(
            "https://otp.example.com",
            TlsFiles {
                server_cert: Some(PathBuf::from("/nonexistent/ca.pem")),
                ..TlsFiles::default()
            },
            Duration::from_secs(5),
        );
        assert!(matches!(conn.build_client(), Err(TransportError::Tls(_))));
    }

    fn testdata(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("src/transport/testdata")
            .join(name)
    }

    #[test]
    fn test_pinned_server_cert_and_client_identity() {
        let conn = Connection::with_tls(
            "https://otp.example.com",
            TlsFiles {
                server_cert: Some(testdata("ca.pem")),
                client_cert: Some(testdata("client.pem")),
                client_key: Some(testdata("client.key")),
            },
            Duration::from_secs(5),
        );
        assert!(conn.build_client().is_ok());
    }

    #[test]
    fn test_pinned_server_cert_only() {
        let conn = Connection::with_tls(
            "https://otp.example.com",
            TlsFiles {
                server_cert: Some(testdata("ca.pem")),
                ..TlsFiles::default()
            },
            Duration::from_secs(5),
        );
        assert!(conn.build_client().is_ok());
    }

    #[test]
    fn test_client_cert_without_key_is_ignored() {
        let conn = Connection::with_tls(
            "https://otp.example.com",
            TlsFiles {
                client_cert: Some(testdata("client.pem")),
                ..TlsFiles::default()
            },
            Duration::from_secs(5),
        );
        assert!(conn.build_client().is_ok());
    }

    #[test]
    fn test_invalid_client_identity_is_tls_error() {
        // A certificate in place of the key does not form an identity
        let conn = Connection::with_tls(
            "https://otp.example.com",
            TlsFiles {
                client_cert: Some(testdata("client.pem")),
                client_key: Some(testdata("ca.pem")),
                ..TlsFiles::default()
            },
            Duration::from_secs(5),
        );
        assert!(matches!(conn.build_client(), Err(TransportError::Tls(_))));
    }

    #[test]
    fn test_transport_security_warning() {
        let certs = TlsFiles {
            server_cert: Some(testdata("ca.pem")),
            ..TlsFiles::default()
        };
        assert_eq!(
            transport_security_warning("http://otp.example.com", &certs),
            Some("Using http is a security risk.")
        );
        assert_eq!(
            transport_security_warning("HTTPS://otp.example.com", &TlsFiles::default()),
            Some("Using https without certificates is a security risk.")
        );
        assert_eq!(transport_security_warning("https://otp.example.com", &certs), None);
    }

    #[test]
    fn test_tls_files_ignored_for_http() {
        let conn = Connection::with_tls(
            "http://otp.example.com",
            TlsFiles {
                server_cert: Some(PathBuf::from("/nonexistent/ca.pem")),
                ..TlsFiles::default()
            },
            Duration::from_secs(5),
        );
        assert!(conn.build_client().is_ok());
    }
}
