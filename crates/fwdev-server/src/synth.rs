// crates/fwdev-server/src/synth.rs
// ============================================================================
// Module: Context Synthesizer
// Description: Cached registry/realm state and per-request HTML injection.
// Purpose: Make every served page look server rendered.
// Dependencies: fwdev-core, tokio
// ============================================================================

//! ## Overview
//! The synthesizer owns two write-once caches guarded by
//! [`tokio::sync::OnceCell`]: the merged registry files and the upstream
//! realm snapshot. Concurrent first requests share one initialization, so the
//! upstream lookup runs once. A failed lookup leaves the cell empty and the
//! next request retries.
//!
//! HTML transformation never fails: any missing input is reported as a
//! `fw_skipped` event and the original document is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use fwdev_core::FwContext;
use fwdev_core::HostInfo;
use fwdev_core::RegistryConfig;
use fwdev_core::SessionIdentity;
use fwdev_core::SynthesisInputs;
use fwdev_core::UrlLookupData;
use fwdev_core::context::split_request_url;
use fwdev_core::inject_script;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::events::DevEvent;
use crate::events::DevEventKind;
use crate::events::SharedEventSink;
use crate::lookup::LookupError;
use crate::lookup::RegistryLookup;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a page is served without a FW context.
#[derive(Debug, Error)]
pub enum SynthError {
    /// Registry files carry no `Realm`.
    #[error("no Realm found in registry files")]
    MissingRealm,
    /// Upstream lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// Script rendering failed.
    #[error("fw context serialization failed: {0}")]
    Render(String),
}

// ============================================================================
// SECTION: Synthesizer
// ============================================================================

/// Builds and injects the FW context for HTML responses.
pub struct ContextSynthesizer {
    /// Registry files merged in order; later files win.
    registry_paths: Vec<PathBuf>,
    /// Realm snapshot source.
    lookup: Arc<dyn RegistryLookup>,
    /// Stable session identity.
    session: Arc<SessionIdentity>,
    /// Host description for URL descriptors.
    host: HostInfo,
    /// Event sink.
    events: SharedEventSink,
    /// Merged registry cache.
    registry: OnceCell<RegistryConfig>,
    /// Realm snapshot cache.
    snapshot: OnceCell<UrlLookupData>,
}

impl ContextSynthesizer {
    /// Creates a synthesizer with empty caches.
    #[must_use]
    pub fn new(
        registry_paths: Vec<PathBuf>,
        lookup: Arc<dyn RegistryLookup>,
        session: Arc<SessionIdentity>,
        host: HostInfo,
        events: SharedEventSink,
    ) -> Self {
        Self {
            registry_paths,
            lookup,
            session,
            host,
            events,
            registry: OnceCell::new(),
            snapshot: OnceCell::new(),
        }
    }

    /// Returns the merged registry, loading it on first use.
    pub async fn registry(&self) -> &RegistryConfig {
        self.registry
            .get_or_init(|| async {
                let paths = self.registry_paths.clone();
                let registry = tokio::task::spawn_blocking(move || {
                    RegistryConfig::load_layered(paths.iter())
                })
                .await
                .unwrap_or_default();
                self.events.record(&DevEvent::info(DevEventKind::RegistryCached {
                    keys: registry.len(),
                    has_realm: registry.realm().is_some(),
                }));
                registry
            })
            .await
    }

    /// Returns the realm snapshot, fetching it on first successful use.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError`] when no realm is configured or the lookup fails.
    pub async fn snapshot(&self) -> Result<&UrlLookupData, SynthError> {
        let registry = self.registry().await;
        let realm = registry.realm().ok_or(SynthError::MissingRealm)?;
        let snapshot = self
            .snapshot
            .get_or_try_init(|| async {
                let data = self.lookup.lookup(realm).await?;
                self.events.record(&DevEvent::info(DevEventKind::LookupCached {
                    realm: realm.to_string(),
                    languages: data.languages().len(),
                }));
                Ok::<_, SynthError>(data)
            })
            .await?;
        Ok(snapshot)
    }

    /// Synthesizes the FW context for an original request URL.
    ///
    /// # Errors
    ///
    /// Returns [`SynthError`] when the cached inputs are unavailable.
    pub async fn context_for(&self, request_url: &str) -> Result<FwContext, SynthError> {
        let lookup = self.snapshot().await?;
        let registry = self.registry().await;
        Ok(FwContext::synthesize(request_url, SynthesisInputs {
            registry,
            lookup,
            session: &self.session,
            host: &self.host,
        }))
    }

    /// Injects the FW context script into `html`.
    ///
    /// Returns `html` unchanged when synthesis fails.
    pub async fn transform_html(&self, request_url: &str, html: String) -> String {
        let (path, _) = split_request_url(request_url);
        let rendered = match self.context_for(request_url).await {
            Ok(context) => context
                .render_script()
                .map(|script| (context, script))
                .map_err(|err| SynthError::Render(err.to_string())),
            Err(err) => Err(err),
        };
        match rendered {
            Ok((context, script)) => {
                self.events.record(&DevEvent::info(DevEventKind::FwInjected {
                    path: path.to_string(),
                    prefix: context.prefix,
                    language: context.locale,
                }));
                inject_script(&html, &script)
            }
            Err(err) => {
                self.events.record(&DevEvent::warn(DevEventKind::FwSkipped {
                    path: path.to_string(),
                    reason: err.to_string(),
                }));
                html
            }
        }
    }
}
