// crates/fwdev-server/src/proxy.rs
// ============================================================================
// Module: API Proxy
// Description: Upstream REST forwarding with session echo and translation.
// Purpose: Let the front-end call the real API from the local dev origin.
// Dependencies: axum, bytes, fwdev-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! Requests under `/_special/rest/` (or the `/_rest/` alias) are forwarded to
//! the upstream host with their method, headers, and body. Transport headers
//! are dropped in both directions.
//!
//! When the inbound `Authorization` header is `Session <token>` carrying the
//! dev session token, the configured CSRF header is set to `valid` on the
//! outbound request. Nothing is ever rejected locally; the upstream enforces
//! authorization.
//!
//! Paths containing `.` or `..` segments are not treated as API calls, so
//! nothing outside the API prefix is reachable through the proxy.
//!
//! JSON responses are passed through the `@token` translator using the
//! locale found in the `Referer` path. Bodies that do not parse are
//! forwarded untouched. Transport failures become a 502 JSON envelope.
//! `Content-Length` is recomputed for relayed bodies; responses without a
//! body (`HEAD`, 204, 304) keep the upstream value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::Json;
use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Response;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use bytes::Bytes;
use fwdev_core::SessionIdentity;
use fwdev_core::TokenTable;
use fwdev_core::prefix::locale_from_path;
use fwdev_core::translate;
use reqwest::Client;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::events::DevEvent;
use crate::events::DevEventKind;
use crate::events::SharedEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Canonical API prefix.
pub const API_PREFIX: &str = "/_special/rest/";
/// Short alias rewritten to [`API_PREFIX`].
pub const API_ALIAS_PREFIX: &str = "/_rest/";
/// Error code of the 502 envelope.
pub const UPSTREAM_UNAVAILABLE_CODE: &str = "upstream_unavailable";
/// Headers never forwarded in either direction.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "content-length",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Proxy failures surfaced as 502 responses.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Upstream URL could not be built.
    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
    /// Upstream request failed.
    #[error("upstream request failed: {0}")]
    Upstream(String),
    /// Upstream body could not be read.
    #[error("upstream body read failed: {0}")]
    Body(String),
}

// ============================================================================
// SECTION: Path Normalization
// ============================================================================

/// Returns the canonical API path when `path` targets the API.
///
/// `/_rest/Foo` becomes `/_special/rest/Foo`; other paths yield `None`, as
/// do API paths with dot segments or backslashes.
#[must_use]
pub fn canonical_api_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix(API_PREFIX).or_else(|| path.strip_prefix(API_ALIAS_PREFIX))?;
    if rest.contains('\\') || rest.split('/').any(is_dot_segment) {
        return None;
    }
    Some(format!("{API_PREFIX}{rest}"))
}

// ============================================================================
// SECTION: Proxy
// ============================================================================

/// Settings for [`ApiProxy`].
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Upstream base URL (no trailing slash).
    pub base_url: String,
    /// Header set when the session token matches.
    pub csrf_header: HeaderName,
    /// Whether JSON responses are translated.
    pub translate: bool,
    /// Language used when the referer carries none.
    pub default_language: String,
    /// Whether per-request events are emitted.
    pub log_requests: bool,
}

/// Forwarding proxy for upstream REST calls.
pub struct ApiProxy {
    /// Proxy settings.
    settings: ProxySettings,
    /// HTTP client configured with timeouts.
    client: Client,
    /// Stable session identity.
    session: Arc<SessionIdentity>,
    /// Dictionary used for translation.
    table: Arc<TokenTable>,
    /// Event sink.
    events: SharedEventSink,
}

/// Upstream response ready to be relayed.
struct Relayed {
    /// Status code.
    status: StatusCode,
    /// Filtered headers.
    headers: HeaderMap,
    /// Body bytes, translated when applicable.
    body: Bytes,
    /// `Content-Length` to report, if any.
    length: Option<HeaderValue>,
    /// Whether translation was applied.
    translated: bool,
}

impl ApiProxy {
    /// Builds a proxy.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError`] when the HTTP client cannot be built.
    pub fn new(
        settings: ProxySettings,
        connect_timeout: Duration,
        request_timeout: Duration,
        session: Arc<SessionIdentity>,
        table: Arc<TokenTable>,
        events: SharedEventSink,
    ) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| ProxyError::Upstream(err.to_string()))?;
        Ok(Self {
            settings: ProxySettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
            client,
            session,
            table,
            events,
        })
    }

    /// Forwards a request whose path is already canonical.
    ///
    /// `path_and_query` is the canonical path plus the original query string.
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Response<Body> {
        let started = Instant::now();
        let path = path_and_query.split_once('?').map_or(path_and_query, |(path, _)| path);
        let csrf_valid = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| self.session.matches_authorization(value));
        let language = self.referer_language(headers);
        let outbound = self.outbound_headers(headers, csrf_valid);
        match self.relay(method.clone(), path_and_query, outbound, body, &language).await {
            Ok(relayed) => {
                if self.settings.log_requests {
                    self.events.record(&DevEvent::info(DevEventKind::ProxyRequest {
                        method: method.to_string(),
                        path: path.to_string(),
                        status: relayed.status.as_u16(),
                        translated: relayed.translated,
                        csrf_valid,
                        duration_ms: started.elapsed().as_millis(),
                    }));
                }
                relayed.into_response()
            }
            Err(err) => {
                self.events.record(&DevEvent::error(DevEventKind::ProxyFailed {
                    method: method.to_string(),
                    path: path.to_string(),
                    message: err.to_string(),
                }));
                bad_gateway(&err)
            }
        }
    }

    /// Sends the outbound request and prepares the response.
    async fn relay(
        &self,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Bytes,
        language: &str,
    ) -> Result<Relayed, ProxyError> {
        let url = Url::parse(&format!("{}{path_and_query}", self.settings.base_url))
            .map_err(|err| ProxyError::InvalidUrl(err.to_string()))?;
        let head = method == Method::HEAD;
        let mut request = self.client.request(method, url).headers(headers);
        if !body.is_empty() {
            request = request.body(body);
        }
        let response = request.send().await.map_err(|err| ProxyError::Upstream(err.to_string()))?;
        let status = response.status();
        let upstream_length = response.headers().get(header::CONTENT_LENGTH).cloned();
        let headers = filter_headers(response.headers());
        let body = response.bytes().await.map_err(|err| ProxyError::Body(err.to_string()))?;
        let has_body = carries_body(head, status);
        let (body, translated) = if has_body && self.should_translate(&headers) {
            match translate_body(&body, &self.table, language) {
                Some(translated) => (translated, true),
                None => (body, false),
            }
        } else {
            (body, false)
        };
        let length =
            if has_body { Some(HeaderValue::from(body.len())) } else { upstream_length };
        Ok(Relayed {
            status,
            headers,
            body,
            length,
            translated,
        })
    }

    /// Builds outbound headers: transport headers dropped, CSRF echo applied.
    fn outbound_headers(&self, inbound: &HeaderMap, csrf_valid: bool) -> HeaderMap {
        let mut headers = filter_headers(inbound);
        headers.remove(&self.settings.csrf_header);
        if self.translation_enabled() {
            headers.remove(header::ACCEPT_ENCODING);
        }
        if csrf_valid {
            headers.insert(
                self.settings.csrf_header.clone(),
                HeaderValue::from_static(fwdev_config::CSRF_VALID_VALUE),
            );
        }
        headers
    }

    /// Returns the translation language inferred from the `Referer` header.
    fn referer_language(&self, headers: &HeaderMap) -> String {
        headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .and_then(|referer| Url::parse(referer).ok())
            .and_then(|url| locale_from_path(url.path()).map(str::to_string))
            .unwrap_or_else(|| self.settings.default_language.clone())
    }

    /// Returns true when translation is configured and the table has entries.
    fn translation_enabled(&self) -> bool {
        self.settings.translate && !self.table.is_empty()
    }

    /// Returns true when a response with `headers` should be translated.
    fn should_translate(&self, headers: &HeaderMap) -> bool {
        self.translation_enabled() && is_json(headers) && is_identity_encoded(headers)
    }
}

impl IntoResponse for Relayed {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if let Some(length) = self.length {
            response.headers_mut().insert(header::CONTENT_LENGTH, length);
        }
        response
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Copies `headers` without transport-specific entries.
fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

/// Returns true for `.` and `..`, including their `%2e` spellings.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Returns true when a response to a request of this kind carries a body.
fn carries_body(head: bool, status: StatusCode) -> bool {
    !head && status != StatusCode::NO_CONTENT && status != StatusCode::NOT_MODIFIED
}

/// Returns true when the content type denotes JSON.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

/// Returns true when the body is not content-encoded.
fn is_identity_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .is_none_or(|value| value.trim().eq_ignore_ascii_case("identity"))
}

/// Translates a JSON body; `None` when it does not parse.
fn translate_body(body: &[u8], table: &TokenTable, language: &str) -> Option<Bytes> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let translated = translate(&value, table, language);
    serde_json::to_vec(&translated).ok().map(Bytes::from)
}

/// Builds the 502 envelope for a proxy failure.
fn bad_gateway(err: &ProxyError) -> Response<Body> {
    let body = json!({
        "error": {
            "code": UPSTREAM_UNAVAILABLE_CODE,
            "message": err.to_string(),
        }
    });
    (StatusCode::BAD_GATEWAY, Json(body)).into_response()
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

    use super::*;

    #[test]
    fn alias_is_rewritten() {
        assert_eq!(canonical_api_path("/_rest/Foo/bar").as_deref(), Some("/_special/rest/Foo/bar"));
        assert_eq!(
            canonical_api_path("/_special/rest/Foo").as_deref(),
            Some("/_special/rest/Foo")
        );
        assert_eq!(canonical_api_path("/_restful/Foo"), None);
        assert_eq!(canonical_api_path("/about"), None);
    }

    #[test]
    fn dot_segments_are_not_api_paths() {
        assert_eq!(canonical_api_path("/_rest/../Other"), None);
        assert_eq!(canonical_api_path("/_special/rest/a/./b"), None);
        assert_eq!(canonical_api_path("/_special/rest/.."), None);
        assert_eq!(canonical_api_path("/_rest/%2E%2e/Other"), None);
        assert_eq!(canonical_api_path("/_rest/a\\..\\b"), None);
        assert_eq!(
            canonical_api_path("/_rest/Item..v2/x.json").as_deref(),
            Some("/_special/rest/Item..v2/x.json")
        );
    }

    #[test]
    fn bodiless_responses_keep_upstream_length() {
        assert!(carries_body(false, StatusCode::OK));
        assert!(!carries_body(true, StatusCode::OK));
        assert!(!carries_body(false, StatusCode::NO_CONTENT));
        assert!(!carries_body(false, StatusCode::NOT_MODIFIED));
    }

    #[test]
    fn transport_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:5173"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("3"));
        headers.append("x-multi", HeaderValue::from_static("a"));
        headers.append("x-multi", HeaderValue::from_static("b"));
        let filtered = filter_headers(&headers);
        assert!(filtered.get(header::HOST).is_none());
        assert!(filtered.get(header::CONNECTION).is_none());
        assert!(filtered.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(filtered.get_all("x-multi").iter().count(), 2);
    }

    #[test]
    fn json_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(is_json(&headers));
        assert!(is_identity_encoded(&headers));
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        assert!(!is_identity_encoded(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        assert!(!is_json(&headers));
    }

    #[test]
    fn unparseable_body_is_not_translated() {
        let table = TokenTable::new();
        assert!(translate_body(b"{not json", &table, "en-US").is_none());
        let out = translate_body(br#"{"a":1}"#, &table, "en-US").unwrap();
        assert_eq!(out.as_ref(), br#"{"a":1}"#);
    }
}
