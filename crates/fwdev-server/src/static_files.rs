// crates/fwdev-server/src/static_files.rs
// ============================================================================
// Module: Static Site
// Description: Web root resolution with SPA fallback.
// Purpose: Decide which file answers a non-API request.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! Paths resolve under the web root. Existing non-HTML files are served as
//! assets. HTML files, directories, and unknown paths resolve to an HTML
//! document (the directory's `index.html` or the SPA entry) that goes
//! through context injection. Paths with `..` segments never resolve.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// HTML document to transform before serving.
    Html(PathBuf),
    /// Asset served verbatim with a content type.
    Asset {
        /// File path.
        path: PathBuf,
        /// Content type header value.
        content_type: &'static str,
    },
    /// Nothing to serve.
    NotFound,
}

/// Static site rooted at a directory.
#[derive(Debug, Clone)]
pub struct StaticSite {
    /// Web root directory.
    root: PathBuf,
    /// SPA entry file name relative to the root.
    index_file: String,
}

impl StaticSite {
    /// Creates a site serving `root` with `index_file` as SPA entry.
    #[must_use]
    pub fn new(root: PathBuf, index_file: impl Into<String>) -> Self {
        Self {
            root,
            index_file: index_file.into(),
        }
    }

    /// Resolves a URL path (without query) to a file.
    #[must_use]
    pub fn resolve(&self, url_path: &str) -> Resolved {
        let mut candidate = self.root.clone();
        for segment in url_path.split('/').filter(|segment| !segment.is_empty()) {
            if segment == ".." || segment == "." || segment.contains('\\') {
                return Resolved::NotFound;
            }
            candidate.push(segment);
        }
        if candidate.is_file() {
            return classify(candidate);
        }
        if candidate.is_dir() {
            let index = candidate.join("index.html");
            if index.is_file() {
                return Resolved::Html(index);
            }
        }
        let entry = self.root.join(&self.index_file);
        if entry.is_file() { Resolved::Html(entry) } else { Resolved::NotFound }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Classifies an existing file as HTML or asset.
fn classify(path: PathBuf) -> Resolved {
    let content_type = content_type_for(&path);
    if content_type.starts_with("text/html") {
        Resolved::Html(path)
    } else {
        Resolved::Asset {
            path,
            content_type,
        }
    }
}

/// Returns the content type for a file extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "txt" => "text/plain; charset=utf-8",
        "wasm" => "application/wasm",
        "webmanifest" => "application/manifest+json",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use std::fs;

    use super::*;

    /// Builds a temporary web root with an entry page, an asset, and a subdirectory.
    fn site() -> (tempfile::TempDir, StaticSite) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html><head></head></html>").unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "console.log(1)").unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.html"), "<html></html>").unwrap();
        let site = StaticSite::new(dir.path().to_path_buf(), "index.html");
        (dir, site)
    }

    #[test]
    fn assets_resolve_with_content_type() {
        let (dir, site) = site();
        assert_eq!(site.resolve("/assets/app.js"), Resolved::Asset {
            path: dir.path().join("assets/app.js"),
            content_type: "text/javascript; charset=utf-8",
        });
    }

    #[test]
    fn directories_and_unknown_paths_resolve_to_html() {
        let (dir, site) = site();
        assert_eq!(site.resolve("/docs/"), Resolved::Html(dir.path().join("docs/index.html")));
        assert_eq!(site.resolve("/"), Resolved::Html(dir.path().join("index.html")));
        assert_eq!(site.resolve("/l/en-US/shop"), Resolved::Html(dir.path().join("index.html")));
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, site) = site();
        assert_eq!(site.resolve("/../etc/passwd"), Resolved::NotFound);
        assert_eq!(site.resolve("/assets/../index.html"), Resolved::NotFound);
    }

    #[test]
    fn missing_entry_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let site = StaticSite::new(dir.path().to_path_buf(), "index.html");
        assert_eq!(site.resolve("/anything"), Resolved::NotFound);
    }
}
