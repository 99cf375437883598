//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound last, so traffic arrives only when ready

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::protocol::{ProtocolRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to build protocol registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("Failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A server ready to run on its bound listener.
pub struct Ready {
    pub server: HttpServer,
    pub listener: TcpListener,
    pub local_addr: SocketAddr,
}

/// Build every subsystem from a validated config and bind the listener.
pub async fn prepare(config: GatewayConfig) -> Result<Ready, StartupError> {
    let registry = Arc::new(ProtocolRegistry::from_config(&config.protocols)?);
    tracing::info!(protocols = ?registry.ids(), "Protocol registry ready");

    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address: address.clone(), source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { address, source })?;

    let server = HttpServer::with_registry(config, registry);
    Ok(Ready { server, listener, local_addr })
}
