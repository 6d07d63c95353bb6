//! Central configuration for the selfservice crate
//!
//! Every component receives a [`SelfServiceConfig`] (or the pieces of it it
//! needs) at construction time. There is no process-wide configuration state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::utils::gen_random_bytes;

/// Placeholder substituted with the application root in configured file paths
pub const HERE_PLACEHOLDER: &str = "%(here)s";

/// Default name of the session cookie issued by the remote service
pub const DEFAULT_REMOTE_COOKIE_NAME: &str = "userauthcookie";

/// Default name of the local anti-forgery session cookie
pub const DEFAULT_LOCAL_SESSION_COOKIE: &str = "linotp_selfservice";

/// Default name of the cookie carrying the signed composite identity
pub const DEFAULT_IDENTITY_COOKIE: &str = "selfservice_auth";

/// Number of leading characters compared by the local session guard
pub const DEFAULT_SESSION_COMPARE_LEN: usize = 40;

/// Remote calls are bounded by this timeout unless configured otherwise
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// File locations used for mutual TLS with the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsFiles {
    pub server_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
}

impl TlsFiles {
    pub fn is_empty(&self) -> bool {
        self.server_cert.is_none() && self.client_cert.is_none() && self.client_key.is_none()
    }
}

/// Configuration shared by the transport, authentication and relay layers
#[derive(Debug, Clone)]
pub struct SelfServiceConfig {
    /// Base URL of the remote token-management service, without trailing slash
    pub remote_url: String,
    /// Application root used for `%(here)s` substitution
    pub here: PathBuf,
    pub tls: TlsFiles,
    pub remote_cookie_name: String,
    pub local_session_cookie: String,
    pub session_compare_len: usize,
    pub identity_cookie: String,
    pub identity_secret: Vec<u8>,
    pub login_form_url: String,
    pub login_handler_path: String,
    pub logout_handler_path: String,
    pub request_timeout: Duration,
}

impl SelfServiceConfig {
    pub fn builder(remote_url: impl Into<String>) -> SelfServiceConfigBuilder {
        SelfServiceConfigBuilder::new(remote_url)
    }

    /// Build the configuration from `SELFSERVICE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// `from_env` is a thin wrapper around this; tests pass a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let remote_url = get("SELFSERVICE_REMOTE_URL")
            .ok_or_else(|| ConfigError::Missing("SELFSERVICE_REMOTE_URL".to_string()))?;

        let mut builder = SelfServiceConfigBuilder::new(remote_url);

        if let Some(here) = get("SELFSERVICE_HERE") {
            builder = builder.here(here);
        }
        if let Some(path) = get("SELFSERVICE_SERVER_CERT") {
            builder = builder.server_cert(path);
        }
        if let Some(path) = get("SELFSERVICE_CLIENT_CERT") {
            builder = builder.client_cert(path);
        }
        if let Some(path) = get("SELFSERVICE_CLIENT_KEY") {
            builder = builder.client_key(path);
        }
        if let Some(name) = get("SELFSERVICE_REMOTE_COOKIE_NAME") {
            builder = builder.remote_cookie_name(name);
        }
        if let Some(name) = get("SELFSERVICE_LOCAL_SESSION_COOKIE") {
            builder = builder.local_session_cookie(name);
        }
        if let Some(len) = get("SELFSERVICE_SESSION_COMPARE_LEN") {
            builder = builder.session_compare_len(parse_number("SELFSERVICE_SESSION_COMPARE_LEN", &len)?);
        }
        if let Some(name) = get("SELFSERVICE_IDENTITY_COOKIE") {
            builder = builder.identity_cookie(name);
        }
        if let Some(secret) = get("SELFSERVICE_IDENTITY_SECRET") {
            builder = builder.identity_secret(secret.into_bytes());
        }
        if let Some(url) = get("SELFSERVICE_LOGIN_FORM_URL") {
            builder = builder.login_form_url(url);
        }
        if let Some(path) = get("SELFSERVICE_LOGIN_HANDLER_PATH") {
            builder = builder.login_handler_path(path);
        }
        if let Some(path) = get("SELFSERVICE_LOGOUT_HANDLER_PATH") {
            builder = builder.logout_handler_path(path);
        }
        if let Some(secs) = get("SELFSERVICE_REQUEST_TIMEOUT") {
            let secs: u64 = parse_number("SELFSERVICE_REQUEST_TIMEOUT", &secs)?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        reason: format!("'{value}' is not a valid number"),
    })
}

#[derive(Debug, Clone)]
pub struct SelfServiceConfigBuilder {
    remote_url: String,
    here: Option<PathBuf>,
    server_cert: Option<String>,
    client_cert: Option<String>,
    client_key: Option<String>,
    remote_cookie_name: String,
    local_session_cookie: String,
    session_compare_len: usize,
    identity_cookie: String,
    identity_secret: Option<Vec<u8>>,
    login_form_url: String,
    login_handler_path: String,
    logout_handler_path: String,
    request_timeout: Duration,
}

impl SelfServiceConfigBuilder {
    fn new(remote_url: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            here: None,
            server_cert: None,
            client_cert: None,
            client_key: None,
            remote_cookie_name: DEFAULT_REMOTE_COOKIE_NAME.to_string(),
            local_session_cookie: DEFAULT_LOCAL_SESSION_COOKIE.to_string(),
            session_compare_len: DEFAULT_SESSION_COMPARE_LEN,
            identity_cookie: DEFAULT_IDENTITY_COOKIE.to_string(),
            identity_secret: None,
            login_form_url: "/account/login".to_string(),
            login_handler_path: "/account/dologin".to_string(),
            logout_handler_path: "/account/logout".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn here(mut self, here: impl Into<PathBuf>) -> Self {
        self.here = Some(here.into());
        self
    }

    pub fn server_cert(mut self, path: impl Into<String>) -> Self {
        self.server_cert = Some(path.into());
        self
    }

    pub fn client_cert(mut self, path: impl Into<String>) -> Self {
        self.client_cert = Some(path.into());
        self
    }

    pub fn client_key(mut self, path: impl Into<String>) -> Self {
        self.client_key = Some(path.into());
        self
    }

    pub fn remote_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.remote_cookie_name = name.into();
        self
    }

    pub fn local_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.local_session_cookie = name.into();
        self
    }

    pub fn session_compare_len(mut self, len: usize) -> Self {
        self.session_compare_len = len;
        self
    }

    pub fn identity_cookie(mut self, name: impl Into<String>) -> Self {
        self.identity_cookie = name.into();
        self
    }

    pub fn identity_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.identity_secret = Some(secret.into());
        self
    }

    pub fn login_form_url(mut self, url: impl Into<String>) -> Self {
        self.login_form_url = url.into();
        self
    }

    pub fn login_handler_path(mut self, path: impl Into<String>) -> Self {
        self.login_handler_path = path.into();
        self
    }

    pub fn logout_handler_path(mut self, path: impl Into<String>) -> Self {
        self.logout_handler_path = path.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<SelfServiceConfig, ConfigError> {
        let parsed = Url::parse(&self.remote_url).map_err(|e| ConfigError::Invalid {
            key: "remote_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "remote_url".to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.session_compare_len == 0 {
            return Err(ConfigError::Invalid {
                key: "session_compare_len".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        for (key, path) in [
            ("login_handler_path", &self.login_handler_path),
            ("logout_handler_path", &self.logout_handler_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    reason: format!("'{path}' must start with '/'"),
                });
            }
        }

        let here = match self.here {
            Some(here) => here,
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        let tls = TlsFiles {
            server_cert: existing_file("server_cert", self.server_cert.as_deref(), &here),
            client_cert: existing_file("client_cert", self.client_cert.as_deref(), &here),
            client_key: existing_file("client_key", self.client_key.as_deref(), &here),
        };

        let identity_secret = match self.identity_secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!(
                    "No identity secret configured, generating a random one. Identity cookies will not survive a restart."
                );
                gen_random_bytes(32).map_err(|e| ConfigError::Invalid {
                    key: "identity_secret".to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        Ok(SelfServiceConfig {
            remote_url: self.remote_url.trim_end_matches('/').to_string(),
            here,
            tls,
            remote_cookie_name: self.remote_cookie_name,
            local_session_cookie: self.local_session_cookie,
            session_compare_len: self.session_compare_len,
            identity_cookie: self.identity_cookie,
            identity_secret,
            login_form_url: self.login_form_url,
            login_handler_path: self.login_handler_path,
            logout_handler_path: self.logout_handler_path,
            request_timeout: self.request_timeout,
        })
    }
}

/// Replace the `%(here)s` placeholder with the application root
pub fn substitute_here(path: &str, here: &Path) -> String {
    if path.contains(HERE_PLACEHOLDER) {
        path.replace(HERE_PLACEHOLDER, &here.to_string_lossy())
    } else {
        path.to_string()
    }
}

fn existing_file(name: &str, path: Option<&str>, here: &Path) -> Option<PathBuf> {
    let path = substitute_here(path?, here);
    let path = PathBuf::from(path);
    if path.exists() {
        Some(path)
    } else {
        tracing::error!("{} {} could not be found", name, path.display());
        None
    }
}
