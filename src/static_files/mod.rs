//! Static bundle subsystem.
//!
//! # Data Flow
//! ```text
//! Static request path
//!     → resolver.rs (normalize → contain → cache flag → file or fallback)
//!     → service.rs (ServeFile: content type, HEAD, ranges, conditional GET)
//!     → Cache-Control override for entry documents
//! ```
//!
//! # Design Decisions
//! - The bundle is read-only; nothing is watched or cached in memory
//! - Unknown paths and directories are not errors, they get the entry document

pub mod resolver;
pub mod service;

pub use resolver::{Resolution, StaticError, StaticResolver, NO_CACHE_DIRECTIVES, NO_CACHE_PATHS};
pub use service::serve_static;
