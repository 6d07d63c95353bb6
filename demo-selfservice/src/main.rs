use std::path::PathBuf;

use selfservice_axum::{SelfServiceConfig, selfservice_router};

mod server;

use crate::server::{ListenerTls, init_tracing, spawn_http_server, spawn_https_server};

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_HTTPS_PORT: u16 = 5443;

fn port_from_env(key: &str, default: u16) -> Result<u16, Box<dyn std::error::Error>> {
    match std::env::var(key) {
        Ok(value) => Ok(value.trim().parse()?),
        Err(_) => Ok(default),
    }
}

fn listener_tls() -> Result<Option<ListenerTls>, Box<dyn std::error::Error>> {
    let (Ok(cert), Ok(key)) = (
        std::env::var("SELFSERVICE_TLS_CERT"),
        std::env::var("SELFSERVICE_TLS_KEY"),
    ) else {
        return Ok(None);
    };
    Ok(Some(ListenerTls {
        port: port_from_env("SELFSERVICE_HTTPS_PORT", DEFAULT_HTTPS_PORT)?,
        cert: PathBuf::from(cert),
        key: PathBuf::from(key),
    }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install default CryptoProvider for rustls to prevent:
    // "no process-level CryptoProvider available -- call CryptoProvider::install_default() before this point"
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::warn!("A rustls CryptoProvider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing(env!("CARGO_CRATE_NAME"));

    let config = SelfServiceConfig::from_env()?;
    tracing::info!("Relaying to remote service at {}", config.remote_url);

    let app = selfservice_router(config);
    let port = port_from_env("SELFSERVICE_PORT", DEFAULT_PORT)?;

    let http_server = spawn_http_server(port, app.clone());
    match listener_tls()? {
        Some(tls) => {
            let https_server = spawn_https_server(tls, app).await?;
            tokio::try_join!(http_server, https_server)?;
        }
        None => http_server.await?,
    }
    Ok(())
}
