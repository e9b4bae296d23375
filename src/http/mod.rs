//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID)
//!     → routing::classify decides proxy vs static
//!     → response.rs (error → status mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, EdgeServer};
