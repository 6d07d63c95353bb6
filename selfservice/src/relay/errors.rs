use thiserror::Error;

use crate::transport::TransportError;

use super::envelope::ErrorCode;

#[derive(Debug, Error, Clone)]
pub enum RelayError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{path}: {status} - {reason}")]
    RemoteStatus {
        path: String,
        status: u16,
        reason: String,
    },

    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl ErrorCode for RelayError {}
