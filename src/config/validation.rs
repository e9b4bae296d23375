//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Parse the backend origin URL once, before anything binds
//! - Validate value ranges (timeouts > 0, ports valid)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::EdgeConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend url {url:?} is not a valid URL: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("backend url {url:?} uses unsupported scheme {scheme:?} (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("backend url {0:?} has no host")]
    MissingHost(String),

    #[error("listener port must be non-zero")]
    ZeroPort,

    #[error("timeout {0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("static root must not be empty")]
    EmptyStaticRoot,

    #[error("index file {0:?} must be a plain file name")]
    InvalidIndexFile(String),

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every error found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_backend_url(&config.backend.url) {
        errors.push(e);
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
        ("request_secs", config.timeouts.request_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if config.static_files.root.trim().is_empty() {
        errors.push(ValidationError::EmptyStaticRoot);
    }

    let index = &config.static_files.index_file;
    if index.is_empty() || index.contains('/') || index.contains('\\') || index == "." || index == ".." {
        errors.push(ValidationError::InvalidIndexFile(index.clone()));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse and check the backend origin URL.
pub fn parse_backend_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidBackendUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ValidationError::MissingHost(raw.to_string())),
    }
}
