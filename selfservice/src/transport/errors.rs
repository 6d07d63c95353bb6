use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("TLS configuration error: {0}")]
    Tls(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("JSON parsing failed: {0}")]
    Json(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}
