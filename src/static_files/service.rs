//! Serving resolved static targets.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::response::forbidden;
use crate::observability::metrics;
use crate::static_files::resolver::{Resolution, StaticResolver, NO_CACHE_DIRECTIVES};

/// Resolve the request path and answer with the file, the entry document,
/// or an error status.
pub async fn serve_static(resolver: &StaticResolver, request: Request<Body>) -> Response {
    let path = request.uri().path().to_owned();

    let resolution = match resolver.resolve(&path).await {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Static resolution failed");
            return e.into_response();
        }
    };

    tracing::debug!(path = %path, resolution = resolution.kind(), "Static path resolved");

    match resolution {
        Resolution::Forbidden => {
            tracing::warn!(path = %path, "Path traversal attempt blocked");
            metrics::record_forbidden();
            forbidden()
        }
        Resolution::File { path, no_cache } | Resolution::Fallback { path, no_cache } => {
            let mut request = request;
            // Any method other than HEAD is answered like GET.
            if request.method() != Method::HEAD {
                *request.method_mut() = Method::GET;
            }

            let mut response = ServeFile::new(path)
                .oneshot(request)
                .await
                .unwrap_or_else(|never| match never {})
                .map(Body::new);

            if no_cache {
                response.headers_mut().insert(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static(NO_CACHE_DIRECTIVES),
                );
            }
            response
        }
    }
}
