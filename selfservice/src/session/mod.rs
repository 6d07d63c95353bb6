mod errors;
mod guard;

pub use errors::SessionError;
pub use guard::{SESSION_KEY_LENGTH, SessionGuard};
