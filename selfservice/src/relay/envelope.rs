use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Error code used when no more specific code applies
pub const DEFAULT_ERROR_CODE: i64 = 311;

/// Errors that can be reported to the browser in the uniform envelope
pub trait ErrorCode: Display {
    fn error_code(&self) -> i64 {
        DEFAULT_ERROR_CODE
    }
}

/// Version reported in every envelope
pub fn version_string() -> String {
    format!("SelfService {}", env!("CARGO_PKG_VERSION"))
}

/// The uniform JSON-RPC style failure reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub jsonrpc: String,
    pub result: EnvelopeResult,
    pub version: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeResult {
    pub status: bool,
    pub error: EnvelopeError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: i64,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: EnvelopeResult {
                status: false,
                error: EnvelopeError {
                    code,
                    message: message.into(),
                },
            },
            version: version_string(),
            id: "1.0".to_string(),
        }
    }

    pub fn from_error<E: ErrorCode + ?Sized>(err: &E) -> Self {
        Self::new(err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::relay::RelayError;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let err = RelayError::RemoteStatus {
            path: "/userservice/enable".to_string(),
            status: 500,
            reason: "Internal Server Error".to_string(),
        };
        let envelope = ErrorEnvelope::from_error(&err);

        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "result": {
                    "status": false,
                    "error": {
                        "code": 311,
                        "message": "/userservice/enable: 500 - Internal Server Error"
                    }
                },
                "version": format!("SelfService {}", env!("CARGO_PKG_VERSION")),
                "id": "1.0"
            })
        );
    }

    #[test]
    fn test_auth_error_uses_default_code() {
        let err = AuthError::InvalidResponse("not json".to_string());
        let envelope = ErrorEnvelope::from_error(&err);
        assert_eq!(envelope.result.error.code, DEFAULT_ERROR_CODE);
        assert!(!envelope.result.error.message.is_empty());
    }
}
