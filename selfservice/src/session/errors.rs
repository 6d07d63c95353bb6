use thiserror::Error;

use crate::utils::UtilError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No valid session")]
    InvalidSession,

    #[error("Utils error: {0}")]
    Utils(String),
}

impl From<UtilError> for SessionError {
    fn from(err: UtilError) -> Self {
        Self::Utils(err.to_string())
    }
}
