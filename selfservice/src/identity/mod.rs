mod errors;
mod ticket;
mod types;

pub use errors::IdentityError;
pub use ticket::{open_identity, seal_identity};
pub use types::{CompositeId, Identity};
