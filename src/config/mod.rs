//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (EdgeConfig::default)
//!     → loader.rs (optional TOML file, then flags / environment)
//!     → validation.rs (semantic checks, backend URL parse)
//!     → EdgeConfig (validated, immutable)
//!     → handed to the forwarder, resolver and listener at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start; there is no reload
//! - All fields have defaults so the process runs with no input at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, CliArgs, ConfigError};
pub use schema::{
    BackendConfig, EdgeConfig, ListenerConfig, LogFormat, ObservabilityConfig, StaticFilesConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
