//! Error responses.
//!
//! # Responsibilities
//! - Map per-request failures to HTTP status codes
//! - Keep response bodies free of paths and error chains
//!
//! # Design Decisions
//! - Upstream connect/protocol errors → 502 Bad Gateway
//! - Upstream timeouts → 504 Gateway Timeout
//! - Static filesystem errors → 500 Internal Server Error

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::proxy::ForwardError;
use crate::static_files::StaticError;

/// 403 for static paths that would leave the root.
pub fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::InvalidUri(_) | ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match status {
            StatusCode::GATEWAY_TIMEOUT => "Gateway Timeout",
            _ => "Bad Gateway",
        };
        (status, body).into_response()
    }
}

impl IntoResponse for StaticError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
