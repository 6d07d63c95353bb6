//! selfservice-axum - Axum routes for the selfservice session relay
//!
//! Mount [`selfservice_router`] to serve the login pages, the user context
//! and the relayed user actions.

mod account;
mod error;
mod portal;
mod router;
mod session;
mod state;
mod userservice;

#[cfg(test)]
mod test_utils;

pub use router::{selfservice_router, selfservice_router_no_trace};
pub use session::{AuthRejection, AuthUser};
pub use state::AppState;

// Re-export the configuration from the core crate
pub use ::selfservice::{ConfigError, SelfServiceConfig};
