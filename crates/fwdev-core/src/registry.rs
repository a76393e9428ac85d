// crates/fwdev-core/src/registry.rs
// ============================================================================
// Module: Registry Config Loader
// Description: Fail-soft loader for INI-style registry key/value files.
// Purpose: Provide the merged registry settings consumed by context synthesis.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! Registry files are flat `key = value` files with `;` comments. Loading is
//! fail-soft: any read or decode failure yields an empty [`RegistryConfig`]
//! so a missing development override never blocks the dev server.
//!
//! ## Invariants
//! - Values are never coerced; every value is a trimmed string.
//! - When layering files, later files win on key collisions and keys unique
//!   to either side survive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Registry key naming the upstream realm.
pub const REALM_KEY: &str = "Realm";
/// Registry key holding the configured fallback currency.
pub const CURRENCY_LIST_KEY: &str = "Currency_List";

// ============================================================================
// SECTION: Registry Config
// ============================================================================

/// Flat registry settings loaded from one or more INI-style files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Key/value entries in key order.
    entries: BTreeMap<String, String>,
}

impl RegistryConfig {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses registry content.
    ///
    /// Blank lines and lines whose first non-whitespace character is `;` are
    /// skipped. Other lines split at the first `=`; lines without `=` or with
    /// an empty key are ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }
        Self {
            entries,
        }
    }

    /// Loads a registry file, returning an empty registry on any failure.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path).map_or_else(|_| Self::new(), |content| Self::parse(&content))
    }

    /// Loads and merges registry files in order; later files win.
    #[must_use]
    pub fn load_layered<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths.into_iter().fold(Self::new(), |merged, path| merged.merged(Self::load(path.as_ref())))
    }

    /// Merges `other` into this registry; `other` wins on key collisions.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Returns this registry merged with `other`.
    #[must_use]
    pub fn merged(mut self, other: Self) -> Self {
        self.merge(other);
        self
    }

    /// Inserts or replaces a single entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the configured realm, treating an empty value as absent.
    #[must_use]
    pub fn realm(&self) -> Option<&str> {
        self.get(REALM_KEY).filter(|value| !value.is_empty())
    }

    /// Returns the configured fallback currency, treating empty as absent.
    #[must_use]
    pub fn currency_fallback(&self) -> Option<&str> {
        self.get(CURRENCY_LIST_KEY).filter(|value| !value.is_empty())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for RegistryConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect(),
        }
    }
}
