// crates/fwdev-server/src/lookup.rs
// ============================================================================
// Module: Realm Lookup
// Description: Upstream URL lookup client for realm snapshots.
// Purpose: Resolve the language list and per-language registry of a realm.
// Dependencies: async-trait, fwdev-core, reqwest, url
// ============================================================================

//! ## Overview
//! The upstream exposes `GET /_special/rest/Registry/Url:lookup?host=<host>@<realm>`
//! returning `{"data": {...}}`. The dev server calls it at most once per
//! successful lookup; caching lives in [`crate::synth::ContextSynthesizer`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use fwdev_core::UrlLookupData;
use fwdev_core::UrlLookupEnvelope;
use reqwest::Client;
use thiserror::Error;
use url::Url;
use url::form_urlencoded;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Upstream path of the URL lookup endpoint.
pub const LOOKUP_PATH: &str = "/_special/rest/Registry/Url:lookup";

// ============================================================================
// SECTION: Public Types
// ============================================================================

/// Realm snapshot source.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    /// Fetches the snapshot for `realm`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the snapshot cannot be obtained.
    async fn lookup(&self, realm: &str) -> Result<UrlLookupData, LookupError>;
}

/// HTTP-backed realm lookup.
pub struct HttpRegistryLookup {
    /// Upstream base URL (no trailing slash).
    base_url: String,
    /// Host name combined with the realm in the query.
    lookup_host: String,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl HttpRegistryLookup {
    /// Builds a lookup client.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        lookup_host: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            lookup_host: lookup_host.into(),
            client,
        })
    }

    /// Returns the lookup URL for `realm`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidUrl`] when the base URL does not parse.
    pub fn lookup_url(&self, realm: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&format!("{}{LOOKUP_PATH}", self.base_url))
            .map_err(|err| LookupError::InvalidUrl(err.to_string()))?;
        let host: String = form_urlencoded::byte_serialize(self.lookup_host.as_bytes()).collect();
        let realm: String = form_urlencoded::byte_serialize(realm.as_bytes()).collect();
        url.set_query(Some(&format!("host={host}@{realm}")));
        Ok(url)
    }
}

#[async_trait]
impl RegistryLookup for HttpRegistryLookup {
    async fn lookup(&self, realm: &str) -> Result<UrlLookupData, LookupError> {
        let url = self.lookup_url(realm)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| LookupError::Unavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(|err| LookupError::Unavailable(err.to_string()))?;
        let envelope: UrlLookupEnvelope =
            serde_json::from_slice(&body).map_err(|err| LookupError::Decode(err.to_string()))?;
        envelope.data.ok_or(LookupError::MissingData)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Realm lookup failures.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Lookup URL could not be built.
    #[error("invalid lookup url: {0}")]
    InvalidUrl(String),
    /// Upstream unreachable or timed out.
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
    /// Upstream returned a non-success status.
    #[error("lookup returned status {0}")]
    Status(u16),
    /// Response body was not a lookup envelope.
    #[error("lookup response invalid: {0}")]
    Decode(String),
    /// Envelope carried no `data`.
    #[error("lookup response has no data")]
    MissingData,
}
