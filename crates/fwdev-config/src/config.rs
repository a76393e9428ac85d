// crates/fwdev-config/src/config.rs
// ============================================================================
// Module: fwdev Configuration
// Description: Configuration loading and validation for the dev server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: fwdev-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path is resolved from an explicit argument, then `FWDEV_CONFIG`, then
//! `fwdev.toml` in the working directory. Only the implicit default file may
//! be absent; built-in defaults apply in that case.
//!
//! Relative paths under `[paths]` resolve against `paths.root`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use fwdev_core::dictionary::is_language_code;
use fwdev_core::version::DEFAULT_VERSION_PLACEHOLDER;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "fwdev.toml";
/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "FWDEV_CONFIG";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Upper bound for upstream connect and request timeouts.
pub const MAX_UPSTREAM_TIMEOUT_MS: u64 = 120_000;
/// Default request body limit (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default upstream API host.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://ws.atonline.com";
/// Default CSRF validity header name.
pub const DEFAULT_CSRF_HEADER: &str = "Sec-Csrf-Token";
/// Value sent in the CSRF validity header.
pub const CSRF_VALID_VALUE: &str = "valid";

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Dev server configuration loaded from `fwdev.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FwDevConfig {
    /// Listener and host description.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream API host settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Filesystem inputs.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Proxy middleware behavior.
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Version placeholder injection.
    #[serde(default)]
    pub version: VersionConfig,
    /// Structured event logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FwDevConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, implicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if implicit && err.kind() == ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => {
                return Err(ConfigError::Io(format!("{}: {err}", resolved.display())));
            }
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.upstream.validate()?;
        self.paths.validate()?;
        self.proxy.validate()?;
        self.version.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the base and development registry file paths.
    #[must_use]
    pub fn registry_paths(&self) -> [PathBuf; 2] {
        [self.paths.resolve(&self.paths.registry), self.paths.resolve(&self.paths.registry_dev)]
    }

    /// Returns the dictionary directory.
    #[must_use]
    pub fn i18n_dir(&self) -> PathBuf {
        self.paths.resolve(&self.paths.i18n_dir)
    }

    /// Returns the static web root.
    #[must_use]
    pub fn web_root(&self) -> PathBuf {
        self.paths.resolve(&self.paths.web_root)
    }

    /// Returns the project root used for git version discovery.
    #[must_use]
    pub fn project_root(&self) -> PathBuf {
        PathBuf::from(&self.paths.root)
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Public `host:port` used in the injected URL descriptor.
    #[serde(default = "default_public_host")]
    pub public_host: String,
    /// Hostname reported to client code.
    #[serde(default = "default_hostname")]
    pub hostname: String,
    /// Maximum inbound request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            public_host: default_public_host(),
            hostname: default_hostname(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is invalid: {}", self.bind)))
    }

    /// Validates listener settings.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.public_host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.public_host must be non-empty".to_string()));
        }
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid("server.hostname must be non-empty".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_body_bytes must be > 0".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Upstream
// ============================================================================

/// Upstream API host configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the upstream REST host.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Host name sent in the realm lookup (`host=<lookup_host>@<realm>`).
    #[serde(default = "default_lookup_host")]
    pub lookup_host: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent for outbound requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            lookup_host: default_lookup_host(),
            connect_timeout_ms: default_connect_timeout_ms(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl UpstreamConfig {
    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// Validates upstream settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|err| ConfigError::Invalid(format!("upstream.base_url is invalid: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "upstream.base_url must use http:// or https://".to_string(),
            ));
        }
        if self.lookup_host.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.lookup_host must be non-empty".to_string()));
        }
        validate_timeout("upstream.connect_timeout_ms", self.connect_timeout_ms)?;
        validate_timeout("upstream.timeout_ms", self.timeout_ms)?;
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Filesystem input locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Project root that relative paths resolve against.
    #[serde(default = "default_root")]
    pub root: String,
    /// Base registry INI file.
    #[serde(default = "default_registry")]
    pub registry: String,
    /// Development override registry INI file.
    #[serde(default = "default_registry_dev")]
    pub registry_dev: String,
    /// Dictionary directory.
    #[serde(default = "default_i18n_dir")]
    pub i18n_dir: String,
    /// Static web root.
    #[serde(default = "default_root")]
    pub web_root: String,
    /// SPA entry document under the web root.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            registry: default_registry(),
            registry_dev: default_registry_dev(),
            i18n_dir: default_i18n_dir(),
            web_root: default_root(),
            index_file: default_index_file(),
        }
    }
}

impl PathsConfig {
    /// Resolves `value` against the project root unless it is absolute.
    #[must_use]
    pub fn resolve(&self, value: &str) -> PathBuf {
        let path = Path::new(value.trim());
        if path.is_absolute() { path.to_path_buf() } else { Path::new(&self.root).join(path) }
    }

    /// Validates path lengths.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.root", &self.root)?;
        validate_path_string("paths.registry", &self.registry)?;
        validate_path_string("paths.registry_dev", &self.registry_dev)?;
        validate_path_string("paths.i18n_dir", &self.i18n_dir)?;
        validate_path_string("paths.web_root", &self.web_root)?;
        validate_path_string("paths.index_file", &self.index_file)?;
        if Path::new(self.index_file.trim()).is_absolute() || self.index_file.contains("..") {
            return Err(ConfigError::Invalid(
                "paths.index_file must be relative to the web root".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Proxy
// ============================================================================

/// Proxy middleware configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    /// Enables forwarding of `/_special/rest/` and `/_rest/` requests.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Enables `@token` translation of JSON responses.
    #[serde(default = "default_true")]
    pub translate: bool,
    /// Header signaling a valid session token upstream.
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
    /// Language used when the referer carries no locale.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            translate: true,
            csrf_header: default_csrf_header(),
            default_language: default_language(),
        }
    }
}

impl ProxyConfig {
    /// Validates proxy settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let header = self.csrf_header.trim();
        if header.is_empty() {
            return Err(ConfigError::Invalid("proxy.csrf_header must be non-empty".to_string()));
        }
        if !header.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
        {
            return Err(ConfigError::Invalid(
                "proxy.csrf_header must be a valid header name".to_string(),
            ));
        }
        if !is_language_code(&self.default_language) {
            return Err(ConfigError::Invalid(
                "proxy.default_language must look like xx-XX".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Version
// ============================================================================

/// Version placeholder configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionConfig {
    /// Enables placeholder replacement.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Placeholder text replaced in HTML.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Fixed version overriding git discovery.
    #[serde(default)]
    pub value: Option<String>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            placeholder: default_placeholder(),
            value: None,
        }
    }
}

impl VersionConfig {
    /// Validates version settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.placeholder.is_empty() {
            return Err(ConfigError::Invalid("version.placeholder must be non-empty".to_string()));
        }
        if self.value.as_deref().is_some_and(|value| value.trim().is_empty()) {
            return Err(ConfigError::Invalid("version.value must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `logging.path`.
    File,
    /// Events discarded.
    None,
}

/// Structured event logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Sink receiving events.
    #[serde(default)]
    pub sink: LogSink,
    /// Log file path for the `file` sink.
    #[serde(default)]
    pub path: Option<String>,
    /// Emits per-request events.
    #[serde(default = "default_true")]
    pub requests: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            sink: LogSink::Stderr,
            path: None,
            requests: true,
        }
    }
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("logging.path", path)?;
        }
        if self.sink == LogSink::File && self.path.is_none() {
            return Err(ConfigError::Invalid(
                "logging.sink = \"file\" requires logging.path".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag is true for the implicit default file.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), false));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), false));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), true))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a timeout lies in `1..=MAX_UPSTREAM_TIMEOUT_MS`.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_UPSTREAM_TIMEOUT_MS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_UPSTREAM_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    "127.0.0.1:5173".to_string()
}

/// Default public host.
fn default_public_host() -> String {
    "localhost:5173".to_string()
}

/// Default hostname.
fn default_hostname() -> String {
    "localhost".to_string()
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default upstream base URL.
fn default_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

/// Default lookup host.
fn default_lookup_host() -> String {
    "localhost".to_string()
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    2_000
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    30_000
}

/// Default user agent.
fn default_user_agent() -> String {
    format!("fwdev/{}", env!("CARGO_PKG_VERSION"))
}

/// Default project and web root.
fn default_root() -> String {
    ".".to_string()
}

/// Default base registry file.
fn default_registry() -> String {
    "etc/registry.ini".to_string()
}

/// Default development registry file.
fn default_registry_dev() -> String {
    "etc/registry_dev.ini".to_string()
}

/// Default dictionary directory.
fn default_i18n_dir() -> String {
    "etc/i18n".to_string()
}

/// Default SPA entry document.
fn default_index_file() -> String {
    "index.html".to_string()
}

/// Default CSRF header name.
fn default_csrf_header() -> String {
    DEFAULT_CSRF_HEADER.to_string()
}

/// Default translation language.
fn default_language() -> String {
    fwdev_core::FALLBACK_LANGUAGE.to_string()
}

/// Default version placeholder.
fn default_placeholder() -> String {
    DEFAULT_VERSION_PLACEHOLDER.to_string()
}

/// Serde default for enabled flags.
const fn default_true() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn validate_path_string_rejects_empty_string() {
        let result = validate_path_string("test_path", "  ");
        assert!(result.unwrap_err().to_string().contains("non-empty"));
    }

    #[test]
    fn validate_path_string_rejects_long_component() {
        let long = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let result = validate_path_string("test_path", &format!("etc/{long}"));
        assert!(result.unwrap_err().to_string().contains("component too long"));
    }

    #[test]
    fn explicit_path_is_not_implicit() {
        let (path, implicit) = resolve_path(Some(Path::new("x.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("x.toml"));
        assert!(!implicit);
    }

    #[test]
    fn timeout_bounds() {
        assert!(validate_timeout("t", 0).is_err());
        assert!(validate_timeout("t", 1).is_ok());
        assert!(validate_timeout("t", MAX_UPSTREAM_TIMEOUT_MS).is_ok());
        assert!(validate_timeout("t", MAX_UPSTREAM_TIMEOUT_MS + 1).is_err());
    }
}
