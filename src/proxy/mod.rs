//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarded request
//!     → forwarder.rs (director: origin URI, Host, X-Forwarded-For)
//!     → headers.rs (hop-by-hop stripping)
//!     → pooled hyper-util client → backend origin
//!     → response relayed unchanged (status, headers, streamed body)
//! ```
//!
//! # Design Decisions
//! - One backend origin, parsed once at startup (origin.rs)
//! - Content-agnostic: bodies are never buffered or rewritten

pub mod forwarder;
pub mod headers;
pub mod origin;

pub use forwarder::{ForwardError, Forwarder};
pub use origin::BackendOrigin;
