//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated config into a ready server
//! - Bind the listener only after every collaborator is built
//! - Start the optional metrics exporter
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last, so an invalid origin never opens the port

use std::io;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, EdgeConfig, ListenerConfig, ValidationError};
use crate::http::EdgeServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::proxy::{BackendOrigin, Forwarder};
use crate::static_files::{StaticError, StaticResolver};

/// Unrecoverable errors before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid backend origin: {0}")]
    Origin(#[from] ValidationError),

    #[error("static root error: {0}")]
    Static(#[from] StaticError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Build the forwarder and resolver, then the server around them.
pub fn build_server(config: EdgeConfig) -> Result<EdgeServer, StartupError> {
    let origin = BackendOrigin::parse(&config.backend.url)?;
    tracing::info!(
        backend = %config.backend.url,
        host = %origin.authority(),
        "Backend origin configured"
    );

    let forwarder = Forwarder::new(origin, &config.timeouts);
    let resolver = StaticResolver::new(&config.static_files)?;
    tracing::info!(root = %resolver.root().display(), "Static root resolved");

    Ok(EdgeServer::new(config, forwarder, resolver))
}

/// Bind the configured listening address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(address = %address, "Listener bound");
    Ok(listener)
}

/// Full startup sequence, then serve until `shutdown` fires.
pub async fn run(config: EdgeConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let observability = config.observability.clone();
    let listener_config = config.listener.clone();

    let server = build_server(config)?;

    if observability.metrics_enabled {
        // Validation already checked the address parses.
        if let Ok(addr) = observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = bind(&listener_config).await?;
    tracing::info!(address = %listener_config.bind_address(), "Server starting");

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
