mod authenticator;
mod enricher;
mod errors;
mod types;

pub use authenticator::authenticate;
pub use enricher::enrich;
pub use errors::AuthError;
pub use types::Credentials;
