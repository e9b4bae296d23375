//! Reverse proxy forwarding to the backend origin.
//!
//! # Responsibilities
//! - Rewrite the inbound request onto the backend origin (director step)
//! - Send it through a pooled HTTP client (plain HTTP or TLS to the backend)
//! - Relay the backend response without touching the body
//!
//! # Design Decisions
//! - Rewrite is a pure function so it can be tested without a socket
//! - Redirects are relayed to the client, never followed
//! - Only the wait for response headers is bounded; bodies stream freely

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, Response, Version},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::TimeoutConfig;
use crate::proxy::headers::{append_forwarded_for, strip_hop_by_hop};
use crate::proxy::origin::BackendOrigin;

/// Why a forwarded request produced no backend response.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("could not build upstream uri: {0}")]
    InvalidUri(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Forwards requests to a single backend origin.
///
/// Cloning is cheap: the origin is shared and the client pool is reference counted.
#[derive(Clone)]
pub struct Forwarder {
    origin: Arc<BackendOrigin>,
    client: Client<HttpsConnector<HttpConnector>, Body>,
    upstream_timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder with its own connection pool.
    pub fn new(origin: BackendOrigin, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);
        connector.enforce_http(false);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            origin: Arc::new(origin),
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    pub fn origin(&self) -> &BackendOrigin {
        &self.origin
    }

    /// Point `request` at the backend origin.
    ///
    /// Method, path, query, end-to-end headers and body are kept. `Host` is
    /// replaced with the origin authority and the client IP is appended to
    /// X-Forwarded-For.
    pub fn rewrite(
        &self,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Request<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = self.origin.target_uri(&parts.uri)?;
        // The pooled client speaks HTTP/1.1 to the backend regardless of the inbound version.
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        parts
            .headers
            .insert(header::HOST, self.origin.host_header().clone());
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut parts.headers, addr.ip());
        }

        Ok(Request::from_parts(parts, body))
    }

    /// Rewrite and send `request`, returning the backend's response as is
    /// (minus hop-by-hop headers).
    pub async fn forward(
        &self,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Body>, ForwardError> {
        let outbound = self.rewrite(request, client_addr)?;

        tracing::debug!(
            method = %outbound.method(),
            uri = %outbound.uri(),
            "Forwarding to backend"
        );

        let response = tokio::time::timeout(self.upstream_timeout, self.client.request(outbound))
            .await
            .map_err(|_| ForwardError::Timeout(self.upstream_timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
