use thiserror::Error;

use crate::relay::ErrorCode;
use crate::transport::TransportError;

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),
}

impl ErrorCode for AuthError {}
