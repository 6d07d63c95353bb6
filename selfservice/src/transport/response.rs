use http::header::{HeaderMap, HeaderValue, SET_COOKIE};
use http::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::TransportError;

/// A fully read reply of the remote service
///
/// The body is consumed when the response arrives so that the accessors can
/// be called any number of times without another await point.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl RemoteResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, TransportError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn reason(&self) -> &str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn set_cookie_headers(&self) -> impl Iterator<Item = &HeaderValue> {
        self.headers.get_all(SET_COOKIE).iter()
    }

    /// Value of the cookie `name` set by this response
    pub fn get_cookie(&self, name: &str) -> Option<String> {
        self.cookie_pair(name)
            .and_then(|pair| pair.split_once('=').map(|(_, v)| v.to_string()))
    }

    /// The `name=value` pair of the cookie `name` set by this response,
    /// without its attributes. The last matching header wins.
    pub fn cookie_pair(&self, name: &str) -> Option<String> {
        self.set_cookie_headers()
            .filter_map(|h| h.to_str().ok())
            .filter_map(|h| h.split(';').next())
            .map(str::trim)
            .filter(|pair| {
                pair.split_once('=')
                    .is_some_and(|(k, _)| k.trim() == name)
            })
            .last()
            .map(str::to_string)
    }
}

/// JSON-RPC shaped reply of the remote service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteReply {
    #[serde(default)]
    pub result: RemoteResult,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteResult {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub error: Option<RemoteErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteErrorDetail {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub message: String,
}

/// JSON truthiness: `false`, `null`, `0`, `""`, `[]` and `{}` are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
