// crates/fwdev-cli/src/i18n.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Message catalog and placeholder substitution for CLI output.
// Purpose: Keep every user-facing CLI string in one table.
// Dependencies: Standard library collections
// ============================================================================

//! ## Overview
//! CLI output goes through [`translate`] (usually via the [`t!`](crate::t)
//! macro). Templates use `{name}` placeholders.
//!
//! ## Invariants
//! - The catalog is built once and read-only thereafter.
//! - Missing keys render as the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces (e.g. `"path"`).
    pub key: &'static str,
    /// Preformatted value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Catalog entries.
const CATALOG: &[(&str, &str)] = &[
    ("main.version", "fwdev {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("input.read_failed", "Failed to read {path}: {error}"),
    (
        "input.read_too_large",
        "Refusing to read {path} because it is {size} bytes (limit {limit}).",
    ),
    ("input.parse_failed", "Failed to parse JSON in {path}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("serve.init_failed", "Failed to initialize dev server: {error}"),
    ("serve.failed", "Dev server failed: {error}"),
    ("serve.listening", "fwdev dev server on http://{bind} (upstream {upstream})"),
    ("i18n.file_skipped", "Warning: skipped dictionary file {path}: {reason}"),
    ("i18n.lang.invalid", "Invalid language code: {value}. Expected xx-YY."),
    ("i18n.render_failed", "Failed to render JSON: {error}"),
    ("prefix.languages.invalid", "Invalid language list entry: {value}. Expected xx-YY."),
];

/// Returns the message catalog.
pub(crate) fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG_MAP.get_or_init(|| CATALOG.iter().copied().collect())
}

/// Returns the raw catalog entries in declaration order.
#[must_use]
pub fn catalog_entries() -> &'static [(&'static str, &'static str)] {
    CATALOG
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Renders `key` while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn catalog_keys_are_unique() {
        let mut seen = BTreeSet::new();
        for (key, _) in catalog_entries() {
            assert!(seen.insert(*key), "duplicate catalog key {key}");
        }
        assert_eq!(seen.len(), catalog().len());
    }

    #[test]
    fn catalog_placeholders_are_balanced() {
        for (key, template) in catalog_entries() {
            let opens = template.matches('{').count();
            let closes = template.matches('}').count();
            assert_eq!(opens, closes, "unbalanced placeholder in {key}");
        }
    }
}
