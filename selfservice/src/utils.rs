use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE32;
use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn gen_random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    Ok(base64url_encode(&gen_random_bytes(len)?))
}

/// RFC 4648 base32 with padding, the encoding used for the combined password field
pub fn base32_encode(input: &str) -> String {
    BASE32.encode(input.as_bytes())
}

pub fn base32_decode(input: &str) -> Result<String, UtilError> {
    let bytes = BASE32
        .decode(input.as_bytes())
        .map_err(|e| UtilError::Format(format!("Failed to decode base32: {e}")))?;
    String::from_utf8(bytes).map_err(|e| UtilError::Format(format!("Invalid UTF-8: {e}")))
}

/// Attributes of a cookie written by this front-end
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    /// `None` produces a browser-session cookie
    pub max_age: Option<i64>,
}

impl CookieOptions {
    pub fn session(http_only: bool, secure: bool) -> Self {
        Self {
            http_only,
            secure,
            max_age: None,
        }
    }
}

pub fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    options: CookieOptions,
) -> Result<(), UtilError> {
    let mut cookie = format!("{name}={value}; SameSite=Lax; Path=/");
    if options.secure {
        cookie.push_str("; Secure");
    }
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if let Some(max_age) = options.max_age {
        let expires_at: DateTime<Utc> = Utc::now() + Duration::seconds(max_age);
        cookie.push_str(&format!(
            "; Max-Age={max_age}; Expires={}",
            expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
        ));
    }
    tracing::trace!("Set-Cookie: {}", cookie);
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(())
}

/// Append a `Set-Cookie` header that makes the browser drop `name`
pub fn header_expire_cookie(headers: &mut HeaderMap, name: &str) -> Result<(), UtilError> {
    header_set_cookie(
        headers,
        name,
        "",
        CookieOptions {
            http_only: false,
            secure: false,
            max_age: Some(-86400),
        },
    )
}
