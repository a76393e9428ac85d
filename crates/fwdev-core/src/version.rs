// crates/fwdev-core/src/version.rs
// ============================================================================
// Module: Version Placeholder
// Description: Git short-hash discovery and HTML placeholder replacement.
// Purpose: Stamp served pages with the commit they were built from.
// Dependencies: thiserror, Standard library
// ============================================================================

//! ## Overview
//! Pages may carry a placeholder such as `%GIT_VERSION%`. The dev server
//! resolves the project's short commit hash once and replaces every
//! occurrence before the FW context is injected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::process::Command;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default placeholder replaced in served HTML.
pub const DEFAULT_VERSION_PLACEHOLDER: &str = "%GIT_VERSION%";
/// Version reported when git discovery fails.
pub const UNKNOWN_VERSION: &str = "unknown";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Git version discovery failures.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The git binary could not be started.
    #[error("failed to run git: {0}")]
    Spawn(String),
    /// git exited unsuccessfully.
    #[error("git rev-parse failed: {0}")]
    Failed(String),
    /// git produced no hash.
    #[error("git rev-parse returned no hash")]
    Empty,
}

// ============================================================================
// SECTION: Version Discovery
// ============================================================================

/// Returns the 7-character short hash of `HEAD` in `dir`.
///
/// # Errors
///
/// Returns [`VersionError`] when git is unavailable or `dir` is not a repository.
pub fn git_short_hash(dir: &Path) -> Result<String, VersionError> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .current_dir(dir)
        .output()
        .map_err(|err| VersionError::Spawn(err.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VersionError::Failed(stderr));
    }
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if hash.is_empty() {
        return Err(VersionError::Empty);
    }
    Ok(hash)
}

/// Replaces every `placeholder` occurrence in `html` with `version`.
#[must_use]
pub fn inject_version(html: &str, placeholder: &str, version: &str) -> String {
    if placeholder.is_empty() {
        return html.to_string();
    }
    html.replace(placeholder, version)
}
