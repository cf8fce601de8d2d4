//! Startup orchestration.
//!
//! # Responsibilities
//! - Start background tasks (metrics exporter, signal listener)
//! - Build the server from validated configuration
//! - Bind the plain or TLS listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::BackendConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::net::tls::{install_crypto_provider, load_tls_config};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid address '{0}'")]
    Address(String),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("TLS: {0}")]
    Tls(#[source] std::io::Error),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Log the effective configuration, one value per line.
pub fn log_config(config: &BackendConfig) {
    tracing::info!("listen address is {}", config.listener.bind_address);
    tracing::info!("VICE domain is {}", config.routing.vice_domain);
    tracing::info!("base URL is {}", config.routing.base_url);
    tracing::info!("lookup backend is {:?}", config.lookup.backend);
    tracing::info!("graphql URL is {}", config.lookup.graphql_url);
    tracing::info!("loading-page-url: {}", config.routing.loading_page_url);
    tracing::info!("landing-page-url: {}", config.routing.landing_page_url);
    tracing::info!("static-file-path: {}", config.static_files.path);
    tracing::info!(
        "disable-custom-header-match is {}",
        config.routing.disable_custom_header_match
    );
    tracing::info!("domain check is {}", config.routing.check_domain);
}

/// Run the default backend until a shutdown signal arrives.
pub async fn run(config: BackendConfig) -> Result<(), StartupError> {
    // Before anything builds a rustls client or server config.
    install_crypto_provider();
    log_config(&config);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let bind: SocketAddr = config
        .listener
        .bind_address
        .parse()
        .map_err(|_| StartupError::Address(config.listener.bind_address.clone()))?;
    let tls = config.listener.tls.clone();

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    match tls {
        Some(tls) => {
            let rustls = load_tls_config(&tls).await.map_err(StartupError::Tls)?;
            server.run_tls(bind, rustls, shutdown.subscribe()).await?;
        }
        None => {
            let listener = TcpListener::bind(bind).await?;
            server.run(listener, shutdown.subscribe()).await?;
        }
    }

    Ok(())
}
