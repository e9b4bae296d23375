//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge process.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Backend origin that forwarded paths are proxied to.
    pub backend: BackendConfig,

    /// Static bundle served for every other path.
    pub static_files: StaticFilesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Backend origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Absolute URL of the backend (e.g., "http://linkding:9090").
    pub url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://linkding:9090".to_string(),
        }
    }
}

/// Static bundle configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory holding the built bundle. Relative paths resolve against the
    /// working directory.
    pub root: String,

    /// Entry document served for `/` and for every unknown path.
    pub index_file: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "dist".to_string(),
            index_file: "index.html".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the backend to produce response headers, in seconds.
    pub upstream_secs: u64,

    /// Whole-request timeout enforced by the server middleware, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 60,
            request_secs: 90,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
