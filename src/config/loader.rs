//! Configuration loading from disk, environment and command line.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command line flags. Every flag can also be supplied through the
/// environment variable named next to it.
#[derive(Debug, Default, Parser)]
#[command(name = "spa-edge-proxy")]
#[command(about = "Serves a single-page app and forwards backend paths to linkding", long_about = None)]
pub struct CliArgs {
    /// Optional TOML config file; flags and environment override its values.
    #[arg(short, long, env = "EDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long, env = "APP_PORT")]
    pub port: Option<u16>,

    /// Interface to bind.
    #[arg(long, env = "EDGE_HOST")]
    pub host: Option<String>,

    /// Backend origin for forwarded paths.
    #[arg(long, env = "LINKDING_CONTAINER_URL")]
    pub backend_url: Option<String>,

    /// Directory holding the built bundle.
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<String>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, env = "EDGE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Overlay the explicitly supplied values onto `config`.
    pub fn apply(&self, config: &mut EdgeConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        // Empty values count as unset.
        if let Some(url) = self.backend_url.as_ref().filter(|u| !u.is_empty()) {
            config.backend.url = url.clone();
        }
        if let Some(dir) = self.static_dir.as_ref().filter(|d| !d.is_empty()) {
            config.static_files.root = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let config = read_config_file(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Build the effective configuration: defaults, then the optional file,
/// then flags/environment. Validated once at the end.
pub fn resolve_config(args: &CliArgs) -> Result<EdgeConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => EdgeConfig::default(),
    };

    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
