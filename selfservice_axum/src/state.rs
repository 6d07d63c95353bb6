use std::sync::Arc;

use selfservice::{
    Connection, LoginChallenge, SelfServiceConfig, SessionGuard, transport_security_warning,
};

/// Shared, read-only state of the self-service routes
///
/// Nothing mutable lives here. Every request builds its own [`Connection`]
/// so a bound user session never leaks to another user.
#[derive(Clone, Debug)]
pub struct AppState {
    pub(crate) config: Arc<SelfServiceConfig>,
    pub(crate) challenge: LoginChallenge,
    pub(crate) guard: SessionGuard,
}

impl AppState {
    pub fn new(config: SelfServiceConfig) -> Self {
        if let Some(warning) = transport_security_warning(&config.remote_url, &config.tls) {
            tracing::warn!("{} Remote service: {}", warning, config.remote_url);
        }
        Self {
            challenge: LoginChallenge::from_config(&config),
            guard: SessionGuard::from_config(&config),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SelfServiceConfig {
        &self.config
    }

    pub(crate) fn connection(&self) -> Connection {
        Connection::new(&self.config)
    }
}
