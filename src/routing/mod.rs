//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → classifier.rs (fixed prefix set)
//!     → Forwarded: proxy::Forwarder
//!     → Static:    static_files::StaticResolver
//! ```
//!
//! # Design Decisions
//! - Prefix set is fixed at compile time, nothing to configure
//! - Deterministic: same input always matches same route
//! - Every path classifies to exactly one class

pub mod classifier;

pub use classifier::{classify, RouteClass, FORWARDED_PREFIXES};
