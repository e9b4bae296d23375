//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by method, route class, status
//! - `edge_request_duration_seconds` (histogram): time to response headers
//! - `edge_upstream_errors_total` (counter): failed forwards by kind
//! - `edge_static_forbidden_total` (counter): blocked traversal attempts
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::proxy::ForwardError;
use crate::routing::RouteClass;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, class: RouteClass, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", class.as_str().to_string()),
        ("status", status.to_string()),
    ];

    counter!("edge_requests_total", &labels).increment(1);
    histogram!("edge_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(error: &ForwardError) {
    let kind = match error {
        ForwardError::Timeout(_) => "timeout",
        ForwardError::Upstream(_) => "connect",
        ForwardError::InvalidUri(_) => "uri",
    };
    counter!("edge_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_forbidden() {
    counter!("edge_static_forbidden_total").increment(1);
}
