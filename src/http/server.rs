//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the single dispatch handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Classify each request and hand it to the forwarder or the static resolver
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::http::request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::proxy::Forwarder;
use crate::routing::{classify, RouteClass};
use crate::static_files::{serve_static, StaticResolver};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub resolver: Arc<StaticResolver>,
}

/// HTTP server for the edge.
pub struct EdgeServer {
    router: Router,
    config: EdgeConfig,
}

impl EdgeServer {
    /// Create a new HTTP server from validated config and its collaborators.
    pub fn new(config: EdgeConfig, forwarder: Forwarder, resolver: StaticResolver) -> Self {
        let state = AppState {
            forwarder,
            resolver: Arc::new(resolver),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request.request_id(),
            )
        });

        Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(trace)
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.url,
            static_root = %self.config.static_files.root,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Single entry point: classify, then forward or serve from disk.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let class = classify(request.uri().path());
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        request_id = %request.request_id(),
        route = %class,
        "Dispatching request"
    );

    let response = match class {
        RouteClass::Forwarded => match state.forwarder.forward(request, client_addr).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = %state.forwarder.origin().authority(),
                    "Upstream error"
                );
                metrics::record_upstream_error(&e);
                e.into_response()
            }
        },
        RouteClass::Static => serve_static(&state.resolver, request).await,
    };

    metrics::record_request(method.as_str(), class, response.status().as_u16(), start_time);
    response
}
