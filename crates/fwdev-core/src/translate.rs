// crates/fwdev-core/src/translate.rs
// ============================================================================
// Module: Token Translator
// Description: Replaces `@token` marker objects inside arbitrary JSON.
// Purpose: Localize proxied REST payloads against the dictionary table.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Upstream payloads embed translatable strings as marker objects of the form
//! `{"@token": ["token_name", ...]}`. Translation walks the JSON value and
//! replaces each marker with the dictionary string for the target language,
//! falling back to [`FALLBACK_LANGUAGE`](crate::dictionary::FALLBACK_LANGUAGE).
//! Markers with no entry at all become a visible placeholder so missing
//! strings show up during development.
//!
//! The input is never mutated; a new value is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::dictionary::TokenTable;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Object key identifying a token marker.
pub const TOKEN_MARKER_KEY: &str = "@token";

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Returns a translated copy of `value` for `language`.
#[must_use]
pub fn translate(value: &Value, table: &TokenTable, language: &str) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| translate(item, table, language)).collect())
        }
        Value::Object(map) => token_name(map).map_or_else(
            || {
                Value::Object(
                    map.iter()
                        .map(|(key, item)| (key.clone(), translate(item, table, language)))
                        .collect(),
                )
            },
            |token| Value::String(resolve_token(table, token, language)),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
    }
}

/// Returns the token name when `map` is a marker object.
///
/// A marker has exactly one key, `@token`, whose value is a non-empty array
/// starting with a string.
#[must_use]
pub fn token_name(map: &Map<String, Value>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    match map.get(TOKEN_MARKER_KEY)? {
        Value::Array(entries) => entries.first()?.as_str(),
        _ => None,
    }
}

/// Resolves a token to its translation or the missing-token placeholder.
#[must_use]
pub fn resolve_token(table: &TokenTable, token: &str, language: &str) -> String {
    table.lookup(token, language).map_or_else(|| missing_placeholder(token), str::to_string)
}

/// Placeholder emitted for tokens absent from the table.
#[must_use]
pub fn missing_placeholder(token: &str) -> String {
    format!("[missing token: {token}]")
}
