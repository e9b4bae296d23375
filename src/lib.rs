//! SPA edge proxy library.
//!
//! One listening port, two destinations:
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::classify
//!                                          │
//!                 ┌────────────────────────┴───────────────────────┐
//!                 ▼ /api /assets /favicons /media /previews /static ▼ everything else
//!          proxy::Forwarder                                  static_files::StaticResolver
//!          (Host rewrite, stream)                            (normalize, contain, fallback)
//!                 │                                                 │
//!                 ▼                                                 ▼
//!          backend origin                                    dist/ (index.html fallback)
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod static_files;

pub use config::EdgeConfig;
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
