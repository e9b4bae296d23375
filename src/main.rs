//! SPA edge proxy.
//!
//! Serves the built single-page app from `dist/` and forwards the backend's
//! paths to linkding.

use std::process::ExitCode;

use clap::Parser;

use spa_edge_proxy::config::{resolve_config, CliArgs, ObservabilityConfig};
use spa_edge_proxy::lifecycle::{signals, startup, Shutdown};
use spa_edge_proxy::observability::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialise logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        backend = %config.backend.url,
        static_root = %config.static_files.root,
        "spa-edge-proxy starting"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    match startup::run(config, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
