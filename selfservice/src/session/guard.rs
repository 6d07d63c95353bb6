//! Local session guard
//!
//! A random value is issued as the local session cookie at login. Page scripts
//! echo it back as the `session` request parameter with every state-changing
//! action, and the guard compares the two. This is independent of the remote
//! session cookie.

use http::{HeaderMap, StatusCode};
use subtle::ConstantTimeEq;

use crate::config::SelfServiceConfig;
use crate::login::ChallengeOutcome;
use crate::utils::{CookieOptions, gen_random_string, header_expire_cookie, header_set_cookie};

use super::errors::SessionError;

/// Random bytes in a freshly issued local session value
pub const SESSION_KEY_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionGuard {
    cookie_name: String,
    compare_len: usize,
}

impl SessionGuard {
    pub fn new(cookie_name: impl Into<String>, compare_len: usize) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            compare_len,
        }
    }

    pub fn from_config(config: &SelfServiceConfig) -> Self {
        Self::new(
            config.local_session_cookie.clone(),
            config.session_compare_len,
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Both values present, non-empty and equal in their first `compare_len` characters
    pub fn verify(&self, cookie: Option<&str>, param: Option<&str>) -> Result<(), SessionError> {
        let (Some(cookie), Some(param)) = (cookie, param) else {
            return Err(SessionError::InvalidSession);
        };
        let cookie = truncate_chars(cookie, self.compare_len);
        let param = truncate_chars(param, self.compare_len);

        if cookie.is_empty() || param.is_empty() {
            return Err(SessionError::InvalidSession);
        }
        if bool::from(cookie.as_bytes().ct_eq(param.as_bytes())) {
            Ok(())
        } else {
            Err(SessionError::InvalidSession)
        }
    }

    /// Decide on a request from its local session cookie and `session` parameter
    ///
    /// `request_path` only appears in the log and must not carry the query.
    pub fn check(
        &self,
        cookie: Option<&str>,
        session_param: Option<&str>,
        request_path: &str,
    ) -> ChallengeOutcome {
        match self.verify(cookie, session_param) {
            Ok(()) => ChallengeOutcome::Continue,
            Err(e) => {
                tracing::error!("The request {} did not pass a valid session", request_path);
                ChallengeOutcome::reject(StatusCode::UNAUTHORIZED, e.to_string())
            }
        }
    }

    /// Append a fresh local session cookie and return its value
    ///
    /// The cookie is readable by page scripts, which must echo it back.
    pub fn issue(&self, headers: &mut HeaderMap, secure: bool) -> Result<String, SessionError> {
        let value = gen_random_string(SESSION_KEY_LENGTH)?;
        header_set_cookie(
            headers,
            &self.cookie_name,
            &value,
            CookieOptions::session(false, secure),
        )?;
        Ok(value)
    }

    pub fn expire(&self, headers: &mut HeaderMap) -> Result<(), SessionError> {
        header_expire_cookie(headers, &self.cookie_name)?;
        Ok(())
    }
}

fn truncate_chars(value: &str, len: usize) -> &str {
    value
        .char_indices()
        .nth(len)
        .map_or(value, |(idx, _)| &value[..idx])
}
