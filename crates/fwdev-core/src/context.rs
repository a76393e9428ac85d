// crates/fwdev-core/src/context.rs
// ============================================================================
// Module: FW Context
// Description: Upstream lookup model and per-request FW context synthesis.
// Purpose: Emulate the configuration object a production page would expose.
// Dependencies: serde, serde_json, url
// ============================================================================

//! ## Overview
//! The FW context object is rebuilt for every HTML request from three inputs:
//! the merged [`RegistryConfig`], the cached [`UrlLookupData`] snapshot, and
//! the [`ParsedPrefix`] of the request path. The stable [`SessionIdentity`]
//! supplies the token and UUID. Rendering produces an inline script that is
//! inserted before `</head>`.
//!
//! ## Resolution Rules
//! - Language: parsed `l` segment, else the first supported language.
//! - Currency: parsed `c` segment, else the language registry
//!   `Currency_Default`, else `Currency_List` from the registry files,
//!   else [`DEFAULT_CURRENCY`].
//! - Empty strings count as absent at every step.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::de::Error as _;
use serde_json::Map;
use serde_json::Value;

use crate::dictionary::FALLBACK_LANGUAGE;
use crate::prefix::ParsedPrefix;
use crate::prefix::parse_prefix;
use crate::registry::RegistryConfig;
use crate::session::SessionIdentity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Currency used when nothing else resolves one.
pub const DEFAULT_CURRENCY: &str = "USD";
/// Branch reported when the lookup omits one.
pub const DEFAULT_BRANCH: &str = "master";
/// Registry key holding a language's default currency.
pub const CURRENCY_DEFAULT_KEY: &str = "Currency_Default";
/// Marker telling client code the page was not server rendered.
pub const SSR_DIAG_MARKER: &str = "nossr";
/// Execution mode marker.
pub const CLIENT_MODE: &str = "client";
/// Closing tag the script is inserted before.
const HEAD_CLOSE_TAG: &str = "</head>";

// ============================================================================
// SECTION: Upstream Lookup Model
// ============================================================================

/// Realm snapshot returned by the upstream URL lookup endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlLookupData {
    /// Registry URL identifier.
    #[serde(rename = "Registry_Url__")]
    pub registry_url: Option<String>,
    /// Domain served by the realm.
    #[serde(rename = "Domain")]
    pub domain: Option<String>,
    /// Site identifier.
    #[serde(rename = "Site__")]
    pub site: Option<String>,
    /// Realm identifier.
    #[serde(rename = "Realm__")]
    pub realm: Option<String>,
    /// Supported language codes; the first is the default.
    #[serde(rename = "Languages", deserialize_with = "null_or_empty_as_default")]
    pub languages: Vec<String>,
    /// Active branch name.
    #[serde(rename = "Branch")]
    pub branch: Option<String>,
    /// Auxiliary framework fields.
    #[serde(rename = "ExtraFw", deserialize_with = "null_or_empty_as_default")]
    pub extra_fw: ExtraFw,
    /// Per-language registry entries.
    #[serde(rename = "Registry", deserialize_with = "null_or_empty_as_default")]
    pub registry: BTreeMap<String, Map<String, Value>>,
}

/// Auxiliary framework fields of a lookup snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraFw {
    /// URL identifier.
    pub urlid: Option<String>,
    /// Realm-scoped metadata blob.
    #[serde(rename = "Realm")]
    pub realm: Option<Value>,
}

/// Envelope returned by the lookup endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlLookupEnvelope {
    /// Lookup payload; absent on upstream errors.
    #[serde(default)]
    pub data: Option<UrlLookupData>,
}

/// Decodes `T`, treating `null` and `[]` as `T::default()`.
///
/// Upstream encoders emit an empty map as `[]` and unset lists as `null`.
fn null_or_empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(T::default()),
        Value::Array(items) if items.is_empty() => Ok(T::default()),
        other => serde_json::from_value(other).map_err(D::Error::custom),
    }
}

impl UrlLookupData {
    /// Returns the supported languages, defaulting to [`FALLBACK_LANGUAGE`].
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        if self.languages.is_empty() {
            vec![FALLBACK_LANGUAGE.to_string()]
        } else {
            self.languages.clone()
        }
    }

    /// Returns the default (first) language.
    #[must_use]
    pub fn default_language(&self) -> &str {
        self.languages.first().map_or(FALLBACK_LANGUAGE, String::as_str)
    }

    /// Returns the registry entry for `language`.
    #[must_use]
    pub fn registry_for(&self, language: &str) -> Option<&Map<String, Value>> {
        self.registry.get(language)
    }

    /// Returns the default currency registered for `language`.
    #[must_use]
    pub fn currency_default(&self, language: &str) -> Option<&str> {
        self.registry_for(language)?
            .get(CURRENCY_DEFAULT_KEY)?
            .as_str()
            .filter(|value| !value.is_empty())
    }
}

// ============================================================================
// SECTION: FW Context Object
// ============================================================================

/// Host details used to describe the request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Public `host:port` the browser uses.
    pub public_host: String,
    /// Bare hostname.
    pub hostname: String,
    /// URL scheme.
    pub scheme: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            public_host: "localhost:5173".to_string(),
            hostname: "localhost".to_string(),
            scheme: "http".to_string(),
        }
    }
}

/// Branch, currency, and locale context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FwRequestContext {
    /// Branch name.
    pub b: String,
    /// Currency code.
    pub c: String,
    /// Language code.
    pub l: String,
}

/// Request URL descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlDescriptor {
    /// Full URL including scheme and host.
    pub full: String,
    /// Public host.
    pub host: String,
    /// Original path, before prefix stripping.
    pub path: String,
    /// URL scheme.
    pub scheme: String,
    /// Raw query string when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Cookie echo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FwCookies {
    /// Locale cookie.
    #[serde(rename = "Locale")]
    pub locale: String,
}

/// Per-request configuration object injected as `window.FW`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FwContext {
    /// Branch/currency/locale context.
    #[serde(rename = "Context")]
    pub context: FwRequestContext,
    /// Parsed query parameters; later duplicates win.
    #[serde(rename = "GET")]
    pub get: BTreeMap<String, String>,
    /// Effective language.
    #[serde(rename = "Locale")]
    pub locale: String,
    /// Realm metadata blob.
    #[serde(rename = "Realm")]
    pub realm: Value,
    /// Registry entry for the effective language.
    #[serde(rename = "Registry")]
    pub registry: Map<String, Value>,
    /// Request URL descriptor.
    #[serde(rename = "URL")]
    pub url: UrlDescriptor,
    /// Diagnostic marker.
    #[serde(rename = "_ssr_diag")]
    pub ssr_diag: String,
    /// Cookie echo.
    pub cookies: FwCookies,
    /// Hostname.
    pub hostname: String,
    /// Execution mode marker.
    pub mode: String,
    /// Path remaining after prefix stripping.
    pub path: String,
    /// Reconstructed prefix.
    pub prefix: String,
    /// CSRF token.
    pub token: String,
    /// Token expiry in milliseconds since the Unix epoch.
    pub token_exp: u64,
    /// URL identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urlid: Option<String>,
    /// Session UUID.
    pub uuid: String,
}

/// Inputs shared by every synthesis call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInputs<'a> {
    /// Merged registry files.
    pub registry: &'a RegistryConfig,
    /// Cached upstream snapshot.
    pub lookup: &'a UrlLookupData,
    /// Stable session identity.
    pub session: &'a SessionIdentity,
    /// Host description.
    pub host: &'a HostInfo,
}

impl FwContext {
    /// Synthesizes the FW context for an original request URL (path + query).
    #[must_use]
    pub fn synthesize(request_url: &str, inputs: SynthesisInputs<'_>) -> Self {
        let SynthesisInputs {
            registry,
            lookup,
            session,
            host,
        } = inputs;
        let (path, query) = split_request_url(request_url);
        let languages = lookup.languages();
        let parsed = parse_prefix(path, &languages);
        let default_language = lookup.default_language();
        let language = parsed.locale().unwrap_or(default_language).to_string();
        let currency = resolve_currency(&parsed, lookup, registry, &language);
        let registry_entry = lookup
            .registry_for(&language)
            .or_else(|| lookup.registry_for(default_language))
            .cloned()
            .unwrap_or_default();
        let branch = lookup
            .branch
            .as_deref()
            .filter(|branch| !branch.is_empty())
            .unwrap_or(DEFAULT_BRANCH)
            .to_string();
        let urlid = lookup
            .extra_fw
            .urlid
            .clone()
            .filter(|urlid| !urlid.is_empty())
            .or_else(|| lookup.registry_url.clone());

        Self {
            context: FwRequestContext {
                b: branch,
                c: currency,
                l: language.clone(),
            },
            get: query.map(parse_query).unwrap_or_default(),
            locale: language.clone(),
            realm: lookup
                .extra_fw
                .realm
                .clone()
                .filter(|realm| !realm.is_null())
                .unwrap_or_else(|| Value::Object(Map::new())),
            registry: registry_entry,
            url: UrlDescriptor {
                full: format!("{}://{}{}", host.scheme, host.public_host, request_url),
                host: host.public_host.clone(),
                path: path.to_string(),
                scheme: host.scheme.clone(),
                query: query.map(str::to_string),
            },
            ssr_diag: SSR_DIAG_MARKER.to_string(),
            cookies: FwCookies {
                locale: language,
            },
            hostname: host.hostname.clone(),
            mode: CLIENT_MODE.to_string(),
            path: parsed.remaining_path,
            prefix: parsed.prefix,
            token: session.token().to_string(),
            token_exp: session.token_exp_ms(),
            urlid,
            uuid: session.uuid().to_string(),
        }
    }

    /// Renders the context as an inline `<script>` defining `FW`.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when serialization fails.
    pub fn render_script(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        let json = String::from_utf8_lossy(&buf).replace("</", "<\\/").replace('\n', "\n    ");
        Ok(format!(
            "<script type=\"text/javascript\">\nvar FW = (function() {{\n    var my = \
             {json};\n    return my;\n}}());\n</script>\n"
        ))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the effective currency for `language`.
fn resolve_currency(
    parsed: &ParsedPrefix,
    lookup: &UrlLookupData,
    registry: &RegistryConfig,
    language: &str,
) -> String {
    parsed
        .currency()
        .or_else(|| lookup.currency_default(language))
        .or_else(|| registry.currency_fallback())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_string()
}

/// Splits a request URL into its path and optional query string.
#[must_use]
pub fn split_request_url(request_url: &str) -> (&str, Option<&str>) {
    match request_url.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|query| !query.is_empty())),
        None => (request_url, None),
    }
}

/// Parses a query string into a flat map; later duplicates win.
#[must_use]
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Inserts `script` before the first `</head>`; HTML without one is unchanged.
#[must_use]
pub fn inject_script(html: &str, script: &str) -> String {
    html.replacen(HEAD_CLOSE_TAG, &format!("{script}{HEAD_CLOSE_TAG}"), 1)
}
