use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderName};
use url::form_urlencoded;

use crate::auth::Credentials;
use crate::config::SelfServiceConfig;
use crate::utils::{UtilError, base32_decode, base32_encode};

use super::form::LoginForm;
use super::types::ChallengeOutcome;

/// Response header whose value is passed to the login form as `reason`
pub const FAILURE_REASON_HEADER: HeaderName =
    HeaderName::from_static("x-authorization-failure-reason");

/// Where the browser is sent after a successful login, whatever it came from
pub const POST_LOGIN_REDIRECT: &str = "/";

/// Pack the one-time password and the password into one field
pub fn combine_password(otp: &str, password: &str) -> String {
    format!("{}:{}", base32_encode(otp), base32_encode(password))
}

/// Reverse [`combine_password`], returning `(otp, password)`
pub fn split_combined_password(combined: &str) -> Result<(String, String), UtilError> {
    let (otp, password) = combined
        .split_once(':')
        .ok_or_else(|| UtilError::Format("missing ':' separator".to_string()))?;
    Ok((base32_decode(otp)?, base32_decode(password)?))
}

/// Form based identify/challenge handshake of the login pages
#[derive(Debug, Clone)]
pub struct LoginChallenge {
    login_form_url: String,
    reason_param: String,
}

impl LoginChallenge {
    pub fn new(login_form_url: impl Into<String>) -> Self {
        Self {
            login_form_url: login_form_url.into(),
            reason_param: "reason".to_string(),
        }
    }

    pub fn from_config(config: &SelfServiceConfig) -> Self {
        Self::new(config.login_form_url.clone())
    }

    pub fn login_form_url(&self) -> &str {
        &self.login_form_url
    }

    /// Extract credentials from a login submission
    ///
    /// Returns `None` unless both `login` and `password` were submitted. An
    /// unqualified login is qualified with a non-empty `realm` field, and the
    /// password is combined with the optional `otp` field.
    ///
    /// `;` separates the login from the remote session in the composite
    /// identity, so a login or realm containing it is refused.
    pub fn identify(&self, form: &LoginForm) -> Option<Credentials> {
        let login = form.login().filter(|l| !l.is_empty())?;
        let password = form.password()?;

        if login.contains(';') || form.realm().is_some_and(|r| r.contains(';')) {
            tracing::warn!("Refusing login name containing ';'");
            return None;
        }

        let login = match form.realm() {
            Some(realm) if !login.contains('@') => format!("{login}@{realm}"),
            _ => login.to_string(),
        };

        Some(Credentials::new(
            login,
            combine_password(form.otp(), password),
        ))
    }

    /// Redirect after a successful identification
    pub fn identified(&self, headers: HeaderMap) -> ChallengeOutcome {
        ChallengeOutcome::Redirect {
            location: POST_LOGIN_REDIRECT.to_string(),
            headers,
        }
    }

    /// Send the browser back to the login form after a failed attempt
    ///
    /// `app_headers` are the headers of the failed attempt: their failure
    /// reason ends up in the query string and their `Set-Cookie` headers are
    /// forwarded together with `forget_headers`.
    pub fn challenge(&self, app_headers: &HeaderMap, forget_headers: HeaderMap) -> ChallengeOutcome {
        let reason = app_headers
            .get(&FAILURE_REASON_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());

        let mut headers = forget_headers;
        for cookie in app_headers.get_all(SET_COOKIE) {
            headers.append(SET_COOKIE, cookie.clone());
        }

        ChallengeOutcome::Redirect {
            location: self.login_url_with_reason(reason),
            headers,
        }
    }

    /// The login form URL with `reason` set, keeping its other query parameters
    pub fn login_url_with_reason(&self, reason: Option<&str>) -> String {
        let (without_fragment, fragment) = match self.login_form_url.split_once('#') {
            Some((url, fragment)) => (url, Some(fragment)),
            None => (self.login_form_url.as_str(), None),
        };
        let (base, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if reason.is_some() && key == self.reason_param {
                continue;
            }
            serializer.append_pair(&key, &value);
        }
        if let Some(reason) = reason {
            serializer.append_pair(&self.reason_param, reason);
        }
        let query = serializer.finish();

        let mut url = base.to_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}
