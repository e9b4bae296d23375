//! Path classification.
//!
//! # Responsibilities
//! - Decide whether a request path belongs to the backend or the static bundle
//!
//! # Design Decisions
//! - Path matching is case-sensitive and anchored at the start
//! - Plain string prefix on the raw path, no normalization first
//! - No regex to guarantee O(n) matching

use std::fmt;

/// Path prefixes owned by the backend application.
pub const FORWARDED_PREFIXES: [&str; 6] = [
    "/api",
    "/assets",
    "/favicons",
    "/media",
    "/previews",
    "/static",
];

/// Where a request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Proxied to the backend origin.
    Forwarded,
    /// Resolved against the static root.
    Static,
}

impl RouteClass {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Forwarded => "forwarded",
            RouteClass::Static => "static",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a request path.
pub fn classify(path: &str) -> RouteClass {
    if FORWARDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        RouteClass::Forwarded
    } else {
        RouteClass::Static
    }
}
