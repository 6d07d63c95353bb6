use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Malformed identity ticket: {0}")]
    Malformed(String),

    #[error("Identity ticket signature mismatch")]
    Signature,

    #[error("Crypto error: {0}")]
    Crypto(String),
}
