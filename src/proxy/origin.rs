//! The fixed backend origin that forwarded requests are sent to.

use std::str::FromStr;

use axum::http::{
    uri::{Authority, PathAndQuery, Scheme},
    HeaderValue, Uri,
};
use url::Url;

use crate::config::validation::{parse_backend_url, ValidationError};

/// Backend origin, parsed once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct BackendOrigin {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    base_query: Option<String>,
    host_header: HeaderValue,
}

impl BackendOrigin {
    /// Parse a backend URL such as `http://linkding:9090`.
    ///
    /// A port written out in `raw` is kept in the authority even when it is
    /// the scheme's default (`http://linkding:80` sends `Host: linkding:80`).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let url = parse_backend_url(raw)?;
        let written_port = raw.trim().parse::<Uri>().ok().and_then(|uri| uri.port_u16());
        Self::from_url(&url, url.port().or(written_port))
    }

    fn from_url(url: &Url, port: Option<u16>) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidBackendUrl {
            url: url.to_string(),
            reason,
        };

        let host = url
            .host_str()
            .ok_or_else(|| ValidationError::MissingHost(url.to_string()))?;
        let authority = match port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let authority = Authority::from_str(&authority).map_err(|e| invalid(e.to_string()))?;
        let scheme = Scheme::from_str(url.scheme()).map_err(|e| invalid(e.to_string()))?;
        let host_header =
            HeaderValue::from_str(authority.as_str()).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
            host_header,
        })
    }

    /// `host[:port]` of the backend, as sent in the `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Build the outbound URI for an inbound one: scheme and authority come
    /// from the origin, the path is appended to the origin's base path and
    /// the queries are merged.
    pub fn target_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path = join_paths(&self.base_path, inbound.path());
        let query = match (self.base_query.as_deref(), inbound.query()) {
            (Some(base), Some(req)) if !req.is_empty() => Some(format!("{base}&{req}")),
            (Some(base), _) => Some(base.to_string()),
            (None, Some(req)) if !req.is_empty() => Some(req.to_string()),
            _ => None,
        };

        let path_and_query = match query {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::from_str(&path_and_query)?)
            .build()
    }
}

/// Join two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}
