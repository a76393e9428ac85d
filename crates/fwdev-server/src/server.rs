// crates/fwdev-server/src/server.rs
// ============================================================================
// Module: Dev Server
// Description: HTTP listener routing API, asset, and HTML requests.
// Purpose: Run the local emulation of the production front-end host.
// Dependencies: axum, fwdev-config, fwdev-core, tokio
// ============================================================================

//! ## Overview
//! [`DevServer`] is built once from [`FwDevConfig`]. Construction generates
//! the session identity, loads the dictionary, resolves the version string,
//! and wires the proxy and synthesizer. Every request goes through a single
//! fallback handler:
//! - API paths are forwarded by [`ApiProxy`].
//! - Other GET/HEAD requests resolve against the web root; HTML documents
//!   get the version stamp and the FW context before being served.
//! - Anything else is answered with 405.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use fwdev_config::FwDevConfig;
use fwdev_core::HostInfo;
use fwdev_core::SessionIdentity;
use fwdev_core::TokenTable;
use fwdev_core::dictionary::load_dir;
use fwdev_core::version::UNKNOWN_VERSION;
use fwdev_core::version::git_short_hash;
use fwdev_core::version::inject_version;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::events::DevEvent;
use crate::events::DevEventKind;
use crate::events::SharedEventSink;
use crate::events::sink_from_config;
use crate::lookup::HttpRegistryLookup;
use crate::lookup::RegistryLookup;
use crate::proxy::ApiProxy;
use crate::proxy::ProxySettings;
use crate::proxy::canonical_api_path;
use crate::static_files::Resolved;
use crate::static_files::StaticSite;
use crate::synth::ContextSynthesizer;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dev server failures.
#[derive(Debug, Error)]
pub enum DevServerError {
    /// Configuration rejected.
    #[error("config error: {0}")]
    Config(String),
    /// Component initialization failed.
    #[error("init error: {0}")]
    Init(String),
    /// Listener failure.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Dev Server
// ============================================================================

/// Shared state for request handlers.
struct AppState {
    /// Upstream API proxy.
    proxy: ApiProxy,
    /// FW context synthesizer.
    synth: ContextSynthesizer,
    /// Static site resolver.
    site: StaticSite,
    /// Whether API proxying is enabled.
    proxy_enabled: bool,
    /// Version placeholder and value, when stamping is enabled.
    version: Option<(String, String)>,
    /// Maximum inbound request body size.
    max_body_bytes: usize,
}

/// Dev server instance.
pub struct DevServer {
    /// Server configuration.
    config: FwDevConfig,
    /// Shared handler state.
    state: Arc<AppState>,
    /// Event sink.
    events: SharedEventSink,
    /// Session identity shared with handlers.
    session: Arc<SessionIdentity>,
}

impl DevServer {
    /// Builds a dev server from configuration, logging to the configured sink.
    ///
    /// # Errors
    ///
    /// Returns [`DevServerError`] when initialization fails.
    pub fn from_config(config: FwDevConfig) -> Result<Self, DevServerError> {
        let events =
            sink_from_config(&config.logging).map_err(|err| DevServerError::Init(err.to_string()))?;
        let lookup = HttpRegistryLookup::new(
            config.upstream.base(),
            config.upstream.lookup_host.clone(),
            Duration::from_millis(config.upstream.connect_timeout_ms),
            Duration::from_millis(config.upstream.timeout_ms),
            &config.upstream.user_agent,
        )
        .map_err(|err| DevServerError::Init(err.to_string()))?;
        Self::with_parts(config, Arc::new(lookup), events)
    }

    /// Builds a dev server with an explicit lookup source and event sink.
    ///
    /// # Errors
    ///
    /// Returns [`DevServerError`] when initialization fails.
    pub fn with_parts(
        config: FwDevConfig,
        lookup: Arc<dyn RegistryLookup>,
        events: SharedEventSink,
    ) -> Result<Self, DevServerError> {
        config.validate().map_err(|err| DevServerError::Config(err.to_string()))?;
        let session = Arc::new(SessionIdentity::generate());
        let table = Arc::new(load_dictionary(&config, &events));
        let csrf_header = HeaderName::from_bytes(config.proxy.csrf_header.trim().as_bytes())
            .map_err(|err| DevServerError::Config(err.to_string()))?;
        let proxy = ApiProxy::new(
            ProxySettings {
                base_url: config.upstream.base().to_string(),
                csrf_header,
                translate: config.proxy.translate,
                default_language: config.proxy.default_language.clone(),
                log_requests: config.logging.requests,
            },
            Duration::from_millis(config.upstream.connect_timeout_ms),
            Duration::from_millis(config.upstream.timeout_ms),
            Arc::clone(&session),
            table,
            Arc::clone(&events),
        )
        .map_err(|err| DevServerError::Init(err.to_string()))?;
        let host = HostInfo {
            public_host: config.server.public_host.clone(),
            hostname: config.server.hostname.clone(),
            ..HostInfo::default()
        };
        let synth = ContextSynthesizer::new(
            config.registry_paths().to_vec(),
            lookup,
            Arc::clone(&session),
            host,
            Arc::clone(&events),
        );
        let version = resolve_version(&config, &events);
        let state = Arc::new(AppState {
            proxy,
            synth,
            site: StaticSite::new(config.web_root(), config.paths.index_file.trim()),
            proxy_enabled: config.proxy.enabled,
            version,
            max_body_bytes: config.server.max_body_bytes,
        });
        Ok(Self {
            config,
            state,
            events,
            session,
        })
    }

    /// Returns the session identity injected into pages.
    #[must_use]
    pub fn session(&self) -> &SessionIdentity {
        &self.session
    }

    /// Returns the request router.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new().fallback(handle_request).with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`DevServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), DevServerError> {
        let addr: SocketAddr =
            self.config.server.bind_addr().map_err(|err| DevServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| DevServerError::Transport(format!("bind {addr} failed: {err}")))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`DevServerError`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), DevServerError> {
        let bind = listener
            .local_addr()
            .map_err(|err| DevServerError::Transport(err.to_string()))?
            .to_string();
        self.events.record(&DevEvent::info(DevEventKind::ServerStarted {
            bind,
        }));
        axum::serve(listener, self.router())
            .await
            .map_err(|err| DevServerError::Transport(format!("http server failed: {err}")))
    }
}

// ============================================================================
// SECTION: Initialization Helpers
// ============================================================================

/// Loads the dictionary directory, reporting skipped files.
fn load_dictionary(config: &FwDevConfig, events: &SharedEventSink) -> TokenTable {
    let load = load_dir(&config.i18n_dir());
    for failure in &load.failures {
        events.record(&DevEvent::warn(DevEventKind::DictionaryFileSkipped {
            path: failure.path.display().to_string(),
            reason: failure.reason.clone(),
        }));
    }
    events.record(&DevEvent::info(DevEventKind::DictionaryLoaded {
        files: load.loaded.len(),
        tokens: load.table.len(),
    }));
    load.table
}

/// Resolves the placeholder and version string when stamping is enabled.
fn resolve_version(config: &FwDevConfig, events: &SharedEventSink) -> Option<(String, String)> {
    if !config.version.enabled {
        return None;
    }
    let (version, source) = match &config.version.value {
        Some(value) => (value.trim().to_string(), "config"),
        None => match git_short_hash(&config.project_root()) {
            Ok(hash) => (hash, "git"),
            Err(err) => {
                events.record(&DevEvent::warn(DevEventKind::VersionFallback {
                    reason: err.to_string(),
                }));
                (UNKNOWN_VERSION.to_string(), "fallback")
            }
        },
    };
    events.record(&DevEvent::info(DevEventKind::VersionResolved {
        version: version.clone(),
        source,
    }));
    Some((config.version.placeholder.clone(), version))
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Routes every request to the proxy, an asset, or the HTML pipeline.
async fn handle_request(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();
    let path_and_query =
        parts.uri.path_and_query().map_or_else(|| path.clone(), ToString::to_string);

    if state.proxy_enabled
        && let Some(canonical) = canonical_api_path(&path)
    {
        let Ok(body) = axum::body::to_bytes(body, state.max_body_bytes).await else {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        };
        let target = parts
            .uri
            .query()
            .map_or_else(|| canonical.clone(), |query| format!("{canonical}?{query}"));
        return state.proxy.forward(parts.method, &target, &parts.headers, body).await;
    }

    if parts.method != Method::GET && parts.method != Method::HEAD {
        let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
        response.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }

    let site = state.site.clone();
    let resolved = tokio::task::spawn_blocking(move || site.resolve(&path))
        .await
        .unwrap_or(Resolved::NotFound);
    match resolved {
        Resolved::Asset {
            path,
            content_type,
        } => match tokio::fs::read(&path).await {
            Ok(bytes) => {
                ([(header::CONTENT_TYPE, content_type)], Body::from(bytes)).into_response()
            }
            Err(_) => StatusCode::NOT_FOUND.into_response(),
        },
        Resolved::Html(path) => match tokio::fs::read_to_string(&path).await {
            Ok(html) => {
                let html = match &state.version {
                    Some((placeholder, version)) => inject_version(&html, placeholder, version),
                    None => html,
                };
                let html = state.synth.transform_html(&path_and_query, html).await;
                (
                    [
                        (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                        (header::CACHE_CONTROL, "no-cache"),
                    ],
                    html,
                )
                    .into_response()
            }
            Err(_) => StatusCode::NOT_FOUND.into_response(),
        },
        Resolved::NotFound => StatusCode::NOT_FOUND.into_response(),
    }
}
