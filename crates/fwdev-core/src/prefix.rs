// crates/fwdev-core/src/prefix.rs
// ============================================================================
// Module: URL Prefix Parser
// Description: Decomposes `/key/value` context segments from request paths.
// Purpose: Recover locale/currency context encoded in the URL prefix.
// Dependencies: serde, Standard library
// ============================================================================

//! ## Overview
//! Request paths may start with a chain of `/<k>/<value>` segments where `k`
//! is a single lowercase ASCII letter, e.g. `/l/en-US/c/USD/about`. Parsing
//! consumes segments from the front until one does not match or a locale
//! segment names a language outside the supported list.
//!
//! ## Invariants
//! - Parsing is pure and deterministic.
//! - Re-parsing [`ParsedPrefix::remaining_path`] yields an empty prefix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dictionary::is_language_code;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Segment key carrying the locale.
pub const LOCALE_KEY: &str = "l";
/// Segment key carrying the currency.
pub const CURRENCY_KEY: &str = "c";

// ============================================================================
// SECTION: Types
// ============================================================================

/// A single recognized `/key/value` segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefixSegment {
    /// Single-letter key.
    pub key: String,
    /// Segment value.
    pub value: String,
}

/// Result of parsing a request path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedPrefix {
    /// Reconstructed prefix, e.g. `/l/en-US/c/USD`; empty when none matched.
    pub prefix: String,
    /// Recognized segments keyed by letter; later duplicates win.
    pub context: BTreeMap<String, String>,
    /// Recognized segments in path order.
    pub segments: Vec<PrefixSegment>,
    /// Path left after stripping recognized segments; never empty.
    pub remaining_path: String,
}

impl ParsedPrefix {
    /// Returns the parsed locale segment.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.context.get(LOCALE_KEY).map(String::as_str)
    }

    /// Returns the parsed currency segment.
    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.context.get(CURRENCY_KEY).map(String::as_str)
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses the context prefix of `path` against the supported `languages`.
#[must_use]
pub fn parse_prefix<S: AsRef<str>>(path: &str, languages: &[S]) -> ParsedPrefix {
    let mut prefix = String::new();
    let mut context = BTreeMap::new();
    let mut segments = Vec::new();
    let mut remaining = path;

    while let Some((key, value, consumed)) = match_segment(remaining) {
        if key == LOCALE_KEY && !languages.iter().any(|language| language.as_ref() == value) {
            break;
        }
        prefix.push('/');
        prefix.push_str(key);
        prefix.push('/');
        prefix.push_str(value);
        context.insert(key.to_string(), value.to_string());
        segments.push(PrefixSegment {
            key: key.to_string(),
            value: value.to_string(),
        });
        remaining = &remaining[consumed..];
    }

    let remaining_path = if remaining.is_empty() { "/".to_string() } else { remaining.to_string() };
    ParsedPrefix {
        prefix,
        context,
        segments,
        remaining_path,
    }
}

/// Matches a leading `/<a-z>/<value>` segment.
///
/// Returns the key, the value, and the number of bytes consumed.
fn match_segment(input: &str) -> Option<(&str, &str, usize)> {
    let rest = input.strip_prefix('/')?;
    let key = rest.get(..1)?;
    if !key.bytes().all(|byte| byte.is_ascii_lowercase()) {
        return None;
    }
    let after_key = rest[1..].strip_prefix('/')?;
    let value_len = after_key.find('/').unwrap_or(after_key.len());
    if value_len == 0 {
        return None;
    }
    let value = &after_key[..value_len];
    Some((key, value, 3 + value_len))
}

// ============================================================================
// SECTION: Locale Inference
// ============================================================================

/// Finds an embedded `/l/<code>` locale segment anywhere in `path`.
///
/// Used for request paths that are not parsed against a language list, such
/// as the path of a `Referer` URL.
#[must_use]
pub fn locale_from_path(path: &str) -> Option<&str> {
    let mut parts = path.split('/').filter(|part| !part.is_empty()).peekable();
    while let Some(part) = parts.next() {
        if part == LOCALE_KEY
            && let Some(value) = parts.peek()
            && is_language_code(value)
        {
            return Some(*value);
        }
    }
    None
}
