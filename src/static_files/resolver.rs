//! Static path resolution.
//!
//! # Responsibilities
//! - Normalize the request path before touching the filesystem
//! - Keep every resolved file inside the static root
//! - Flag the entry documents that must never be cached
//! - Fall back to the entry document for unknown paths and directories
//!
//! # Design Decisions
//! - Containment uses `Path::starts_with` (component-wise), never a string prefix
//! - Both the root and existing candidates are canonicalized, so symlinks
//!   leading out of the root are rejected
//! - Nothing is cached between requests; every call hits the filesystem afresh

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::fs;

use crate::config::StaticFilesConfig;

/// Normalized paths whose responses must always be revalidated.
pub const NO_CACHE_PATHS: [&str; 3] = ["/", "/index.html", "/sw.js"];

/// Cache-Control value sent for [`NO_CACHE_PATHS`].
pub const NO_CACHE_DIRECTIVES: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// Filesystem problems that are neither "missing" nor "outside the root".
#[derive(Debug, Error)]
pub enum StaticError {
    #[error("static root {} cannot be resolved: {}", .path.display(), .source)]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot access {}: {}", .path.display(), .source)]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Outcome of resolving one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An existing regular file under the root.
    File { path: PathBuf, no_cache: bool },
    /// The entry document, because nothing under the root matched.
    Fallback { path: PathBuf, no_cache: bool },
    /// The path points outside the root.
    Forbidden,
}

impl Resolution {
    /// File to serve, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::File { path, .. } | Resolution::Fallback { path, .. } => Some(path.as_path()),
            Resolution::Forbidden => None,
        }
    }

    pub fn no_cache(&self) -> bool {
        match self {
            Resolution::File { no_cache, .. } | Resolution::Fallback { no_cache, .. } => *no_cache,
            Resolution::Forbidden => false,
        }
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Resolution::File { .. } => "file",
            Resolution::Fallback { .. } => "fallback",
            Resolution::Forbidden => "forbidden",
        }
    }
}

/// Resolves request paths against a fixed, canonical static root.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    root: PathBuf,
    index: PathBuf,
    /// Set when the root did not exist at startup; it is canonicalized again
    /// per request until it does.
    pending: Option<PathBuf>,
}

impl StaticResolver {
    /// Resolve the configured root once.
    ///
    /// A root that does not exist yet is anchored at its deepest existing
    /// ancestor so the process can still start; until the bundle appears,
    /// every request falls back to a missing entry document.
    pub fn new(config: &StaticFilesConfig) -> Result<Self, StaticError> {
        let configured = Path::new(&config.root);

        let (root, pending) = match std::fs::canonicalize(configured) {
            Ok(root) => (root, None),
            Err(e) => {
                let absolute = std::path::absolute(configured).map_err(|source| StaticError::Root {
                    path: configured.to_path_buf(),
                    source,
                })?;
                tracing::warn!(
                    root = %absolute.display(),
                    error = %e,
                    "Static root not found, serving without it"
                );
                (anchor_missing(&absolute), Some(absolute))
            }
        };

        let index = root.join(&config.index_file);
        Ok(Self {
            root,
            index,
            pending,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The entry document served for `/` and unknown paths.
    pub fn index(&self) -> &Path {
        &self.index
    }

    /// Resolve a raw request path (as found in the request URI).
    pub async fn resolve(&self, request_path: &str) -> Result<Resolution, StaticError> {
        let Some(segments) = normalize(request_path) else {
            return Ok(Resolution::Forbidden);
        };

        let root = self.current_root().await;
        let candidate = segments.iter().fold(root.to_path_buf(), |path, s| path.join(s));
        if !candidate.starts_with(&root) {
            return Ok(Resolution::Forbidden);
        }

        let no_cache = NO_CACHE_PATHS.contains(&to_request_path(&segments).as_str());

        let real = match fs::canonicalize(&candidate).await {
            Ok(real) => real,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(StaticError::Access {
                    path: candidate,
                    source: e,
                });
            }
            Err(_) => return Ok(self.fallback(no_cache)),
        };

        if !real.starts_with(&root) {
            return Ok(Resolution::Forbidden);
        }

        match fs::metadata(&real).await {
            Ok(meta) if meta.is_file() => Ok(Resolution::File {
                path: real,
                no_cache,
            }),
            Ok(_) => Ok(self.fallback(no_cache)),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(StaticError::Access {
                path: real,
                source: e,
            }),
            Err(_) => Ok(self.fallback(no_cache)),
        }
    }

    /// The canonical root, re-resolved while the configured root was missing
    /// at startup.
    async fn current_root(&self) -> Cow<'_, Path> {
        match &self.pending {
            Some(configured) => match fs::canonicalize(configured).await {
                Ok(root) => Cow::Owned(root),
                Err(_) => Cow::Borrowed(&self.root),
            },
            None => Cow::Borrowed(&self.root),
        }
    }

    fn fallback(&self, no_cache: bool) -> Resolution {
        Resolution::Fallback {
            path: self.index.clone(),
            no_cache,
        }
    }
}

/// Canonicalize the deepest existing ancestor of `absolute` and re-attach
/// the missing tail.
fn anchor_missing(absolute: &Path) -> PathBuf {
    absolute
        .ancestors()
        .skip(1)
        .find_map(|ancestor| {
            let real = std::fs::canonicalize(ancestor).ok()?;
            let tail = absolute.strip_prefix(ancestor).ok()?;
            Some(real.join(tail))
        })
        .unwrap_or_else(|| absolute.to_path_buf())
}

/// Percent-decode and normalize a request path into segments relative to
/// the root.
///
/// Returns `None` when a `..` climbs above the root or the path cannot name
/// a file (invalid UTF-8, NUL bytes).
pub fn normalize(request_path: &str) -> Option<Vec<String>> {
    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<String> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other.to_string()),
        }
    }

    Some(segments)
}

/// Canonical `/a/b` form of normalized segments; `/` for the root.
pub fn to_request_path(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    fn segments(path: &str) -> Option<String> {
        normalize(path).map(|s| to_request_path(&s))
    }

    fn bundle() -> (TempDir, StaticResolver) {
        let dir = TempDir::new().unwrap();
        stdfs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
        stdfs::write(dir.path().join("sw.js"), "self.addEventListener('fetch', () => {})").unwrap();
        stdfs::write(dir.path().join("app.js"), "console.log('app')").unwrap();
        stdfs::create_dir_all(dir.path().join("app-assets")).unwrap();
        stdfs::write(dir.path().join("app-assets/index-3f2a.css"), "body{}").unwrap();

        let config = StaticFilesConfig {
            root: dir.path().to_string_lossy().into_owned(),
            index_file: "index.html".to_string(),
        };
        let resolver = StaticResolver::new(&config).unwrap();
        (dir, resolver)
    }

    #[test]
    fn test_normalize_collapses_segments() {
        assert_eq!(segments("/").as_deref(), Some("/"));
        assert_eq!(segments("").as_deref(), Some("/"));
        assert_eq!(segments("//a///b/").as_deref(), Some("/a/b"));
        assert_eq!(segments("/a/./b/../c").as_deref(), Some("/a/c"));
        assert_eq!(segments("/index.html/").as_deref(), Some("/index.html"));
        assert_eq!(segments("/a/b/../../sw.js").as_deref(), Some("/sw.js"));
    }

    #[test]
    fn test_normalize_decodes_percent_escapes() {
        assert_eq!(segments("/caf%C3%A9.png").as_deref(), Some("/café.png"));
        assert_eq!(segments("/a%2Fb").as_deref(), Some("/a/b"));
        assert_eq!(segments("/x/%2e%2e/sw.js").as_deref(), Some("/sw.js"));
    }

    #[test]
    fn test_normalize_rejects_escape() {
        assert_eq!(segments("/.."), None);
        assert_eq!(segments("/../../etc/passwd"), None);
        assert_eq!(segments("/a/../../etc/passwd"), None);
        assert_eq!(segments("/%2e%2e/%2e%2e/etc/passwd"), None);
        assert_eq!(segments("/..%2f..%2fetc/passwd"), None);
    }

    #[test]
    fn test_normalize_rejects_unrepresentable() {
        assert_eq!(segments("/%00index.html"), None);
        assert_eq!(segments("/%ff"), None);
    }

    #[tokio::test]
    async fn test_root_serves_index_without_cache() {
        let (_dir, resolver) = bundle();

        let resolution = resolver.resolve("/").await.unwrap();
        assert_eq!(resolution.path(), Some(resolver.index()));
        assert!(resolution.no_cache());
    }

    #[tokio::test]
    async fn test_entry_documents_not_cached() {
        let (_dir, resolver) = bundle();

        for path in ["/index.html", "/sw.js", "/./sw.js", "/app-assets/../index.html"] {
            let resolution = resolver.resolve(path).await.unwrap();
            assert!(matches!(resolution, Resolution::File { .. }), "{path}");
            assert!(resolution.no_cache(), "{path}");
        }
    }

    #[tokio::test]
    async fn test_regular_file_served_directly() {
        let (_dir, resolver) = bundle();

        let resolution = resolver.resolve("/app.js").await.unwrap();
        assert_eq!(
            resolution,
            Resolution::File {
                path: resolver.root().join("app.js"),
                no_cache: false,
            }
        );

        let nested = resolver.resolve("/app-assets/index-3f2a.css").await.unwrap();
        assert_eq!(nested.path(), Some(resolver.root().join("app-assets/index-3f2a.css").as_path()));
    }

    #[tokio::test]
    async fn test_unknown_route_falls_back() {
        let (_dir, resolver) = bundle();

        let resolution = resolver.resolve("/some/unknown/route").await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Fallback {
                path: resolver.index().to_path_buf(),
                no_cache: false,
            }
        );
    }

    #[tokio::test]
    async fn test_directory_and_file_parent_fall_back() {
        let (_dir, resolver) = bundle();

        assert!(matches!(
            resolver.resolve("/app-assets/").await.unwrap(),
            Resolution::Fallback { .. }
        ));
        assert!(matches!(
            resolver.resolve("/app.js/child").await.unwrap(),
            Resolution::Fallback { .. }
        ));
    }

    #[tokio::test]
    async fn test_traversal_forbidden() {
        let (_dir, resolver) = bundle();

        for path in ["/../../etc/passwd", "/%2e%2e/%2e%2e/etc/passwd", "/app-assets/../../x"] {
            assert_eq!(resolver.resolve(path).await.unwrap(), Resolution::Forbidden, "{path}");
        }
    }

    #[tokio::test]
    async fn test_sibling_with_shared_prefix_not_contained() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("dist");
        let sibling = parent.path().join("dist-evil");
        stdfs::create_dir_all(&root).unwrap();
        stdfs::create_dir_all(&sibling).unwrap();
        stdfs::write(root.join("index.html"), "app").unwrap();
        stdfs::write(sibling.join("secret.txt"), "secret").unwrap();

        let resolver = StaticResolver::new(&StaticFilesConfig {
            root: root.to_string_lossy().into_owned(),
            index_file: "index.html".to_string(),
        })
        .unwrap();

        assert_eq!(
            resolver.resolve("/../dist-evil/secret.txt").await.unwrap(),
            Resolution::Forbidden
        );
        // A string prefix check would accept this; component-wise does not.
        assert!(!sibling.join("secret.txt").starts_with(&root));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_forbidden() {
        let outside = TempDir::new().unwrap();
        stdfs::write(outside.path().join("passwd"), "root:x:0:0").unwrap();

        let (dir, resolver) = bundle();
        std::os::unix::fs::symlink(outside.path().join("passwd"), dir.path().join("leak")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("leakdir")).unwrap();

        assert_eq!(resolver.resolve("/leak").await.unwrap(), Resolution::Forbidden);
        assert_eq!(resolver.resolve("/leakdir/passwd").await.unwrap(), Resolution::Forbidden);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_inside_root_allowed() {
        let (dir, resolver) = bundle();
        std::os::unix::fs::symlink(dir.path().join("app.js"), dir.path().join("latest.js")).unwrap();

        let resolution = resolver.resolve("/latest.js").await.unwrap();
        assert_eq!(resolution.path(), Some(resolver.root().join("app.js").as_path()));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let (_dir, resolver) = bundle();

        for path in ["/", "/app.js", "/missing", "/../etc/passwd"] {
            let first = resolver.resolve(path).await.unwrap();
            let second = resolver.resolve(path).await.unwrap();
            assert_eq!(first, second, "{path}");
        }
    }

    #[tokio::test]
    async fn test_missing_root_still_constructs() {
        let parent = TempDir::new().unwrap();
        let resolver = StaticResolver::new(&StaticFilesConfig {
            root: parent.path().join("not-built").to_string_lossy().into_owned(),
            index_file: "index.html".to_string(),
        })
        .unwrap();

        assert!(resolver.root().is_absolute());
        assert!(matches!(
            resolver.resolve("/anything").await.unwrap(),
            Resolution::Fallback { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_root_created_after_startup_behind_symlink() {
        let parent = TempDir::new().unwrap();
        let real_site = parent.path().join("real-site");
        stdfs::create_dir_all(&real_site).unwrap();
        std::os::unix::fs::symlink(&real_site, parent.path().join("site")).unwrap();

        let resolver = StaticResolver::new(&StaticFilesConfig {
            root: parent.path().join("site/dist").to_string_lossy().into_owned(),
            index_file: "index.html".to_string(),
        })
        .unwrap();
        assert!(resolver.root().starts_with(stdfs::canonicalize(&real_site).unwrap()));

        stdfs::create_dir_all(real_site.join("dist")).unwrap();
        stdfs::write(real_site.join("dist/app.js"), "console.log('late')").unwrap();

        let resolution = resolver.resolve("/app.js").await.unwrap();
        assert!(matches!(resolution, Resolution::File { .. }), "{resolution:?}");
        assert_eq!(resolver.resolve("/../x").await.unwrap(), Resolution::Forbidden);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_ancestor_linked_after_startup() {
        let parent = TempDir::new().unwrap();
        let resolver = StaticResolver::new(&StaticFilesConfig {
            root: parent.path().join("current/dist").to_string_lossy().into_owned(),
            index_file: "index.html".to_string(),
        })
        .unwrap();

        let release = parent.path().join("release-42");
        stdfs::create_dir_all(release.join("dist")).unwrap();
        stdfs::write(release.join("dist/app.js"), "console.log('v42')").unwrap();
        std::os::unix::fs::symlink(&release, parent.path().join("current")).unwrap();

        let resolution = resolver.resolve("/app.js").await.unwrap();
        assert!(matches!(resolution, Resolution::File { .. }), "{resolution:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permission_denied_is_access_error() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, resolver) = bundle();
        let locked = dir.path().join("locked");
        stdfs::create_dir_all(&locked).unwrap();
        stdfs::write(locked.join("app.js"), "console.log('locked')").unwrap();
        stdfs::set_permissions(&locked, stdfs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to root.
        let bypassed = stdfs::read_dir(&locked).is_ok();
        let result = resolver.resolve("/locked/app.js").await;
        stdfs::set_permissions(&locked, stdfs::Permissions::from_mode(0o755)).unwrap();
        if bypassed {
            return;
        }

        assert!(matches!(result, Err(StaticError::Access { .. })), "{result:?}");
    }
}
