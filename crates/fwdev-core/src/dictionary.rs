// crates/fwdev-core/src/dictionary.rs
// ============================================================================
// Module: i18n Dictionary
// Description: Token table plus CSV and INI dictionary file loaders.
// Purpose: Build the token -> language -> string table used by translation.
// Dependencies: serde, Standard library
// ============================================================================

//! ## Overview
//! Translation dictionaries live in a directory of `.csv` and `.ini` files.
//! Files are read in lexicographic order and merged entry by entry: a later
//! file overwrites only the `(token, language)` pairs it defines.
//!
//! INI files come in two layouts, detected per section header:
//! - `[en-US]` sections hold `token = value` lines.
//! - `[token]` sections hold `en-US = value` lines.
//!
//! A missing directory yields an empty table. Unreadable files are reported
//! in [`DictionaryLoad::failures`] and otherwise skipped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Language used when a token has no entry for the requested language.
pub const FALLBACK_LANGUAGE: &str = "en-US";

// ============================================================================
// SECTION: Token Table
// ============================================================================

/// Token name -> language code -> translated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenTable {
    /// Entries keyed by token, then language.
    tokens: BTreeMap<String, BTreeMap<String, String>>,
}

impl TokenTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a translation, replacing only this `(token, language)` pair.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        language: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.tokens.entry(token.into()).or_default().insert(language.into(), value.into());
    }

    /// Returns the exact entry for `token` in `language`.
    #[must_use]
    pub fn get(&self, token: &str, language: &str) -> Option<&str> {
        self.tokens.get(token)?.get(language).map(String::as_str)
    }

    /// Returns the entry for `language`, falling back to [`FALLBACK_LANGUAGE`].
    #[must_use]
    pub fn lookup(&self, token: &str, language: &str) -> Option<&str> {
        let languages = self.tokens.get(token)?;
        languages.get(language).or_else(|| languages.get(FALLBACK_LANGUAGE)).map(String::as_str)
    }

    /// Merges `other` into this table pair by pair; `other` wins.
    pub fn merge(&mut self, other: Self) {
        for (token, languages) in other.tokens {
            self.tokens.entry(token).or_default().extend(languages);
        }
    }

    /// Returns the number of distinct tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true when the table holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the language entries recorded for `token`.
    #[must_use]
    pub fn languages(&self, token: &str) -> Option<&BTreeMap<String, String>> {
        self.tokens.get(token)
    }
}

// ============================================================================
// SECTION: Language Codes
// ============================================================================

/// Returns true when `value` has the `xx-XX` language code shape.
///
/// Only the length and the dash position are checked; this is enough to tell
/// the two INI layouts apart.
#[must_use]
pub fn is_language_code(value: &str) -> bool {
    value.chars().count() == 5 && value.chars().nth(2) == Some('-')
}

// ============================================================================
// SECTION: CSV Format
// ============================================================================

/// Parses a CSV dictionary.
///
/// The first line is the header; its first column is ignored and the rest
/// are language codes. Each row maps its first field (the token) to the
/// positional language values. Blank values are not recorded.
#[must_use]
pub fn parse_csv(content: &str) -> TokenTable {
    let mut table = TokenTable::new();
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return table;
    };
    let languages: Vec<String> = split_csv_line(header.trim_start_matches('\u{feff}'))
        .into_iter()
        .skip(1)
        .map(|language| language.trim().to_string())
        .collect();
    for line in lines {
        let fields = split_csv_line(line);
        let Some(token) = fields.first().map(|token| token.trim()) else {
            continue;
        };
        if token.is_empty() {
            continue;
        }
        for (language, value) in languages.iter().zip(fields.iter().skip(1)) {
            let value = value.trim();
            if language.is_empty() || value.is_empty() {
                continue;
            }
            table.insert(token, language.as_str(), value);
        }
    }
    table
}

/// Splits one CSV line, honoring double-quoted fields with `""` escapes.
///
/// Quoted fields may contain commas but not line breaks.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    fields.push(field);
    fields
}

// ============================================================================
// SECTION: INI Format
// ============================================================================

/// Section currently being read in an INI dictionary.
enum IniSection {
    /// `[en-US]` layout: entries are `token = value`.
    Language(String),
    /// `[token]` layout: entries are `language = value`.
    Token(String),
}

/// Parses an INI dictionary in either layout.
///
/// Lines before the first section header and comment lines starting with
/// `;` or `#` are ignored. Values wrapped in double quotes are unwrapped.
#[must_use]
pub fn parse_ini(content: &str) -> TokenTable {
    let mut table = TokenTable::new();
    let mut section: Option<IniSection> = None;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }
        if let Some(name) = trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let name = name.trim().to_string();
            section = Some(if is_language_code(&name) {
                IniSection::Language(name)
            } else {
                IniSection::Token(name)
            });
            continue;
        }
        let Some(current) = &section else {
            continue;
        };
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = unquote(value.trim());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        match current {
            IniSection::Language(language) => table.insert(key, language.as_str(), value),
            IniSection::Token(token) => table.insert(token.as_str(), key, value),
        }
    }
    table
}

/// Strips one pair of surrounding double quotes.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

// ============================================================================
// SECTION: Directory Loading
// ============================================================================

/// Supported dictionary file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryFormat {
    /// Header row of language codes, one token per row.
    Csv,
    /// Section-based INI in either layout.
    Ini,
}

impl DictionaryFormat {
    /// Detects the format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "ini" => Some(Self::Ini),
            _ => None,
        }
    }

    /// Parses content in this format.
    #[must_use]
    pub fn parse(self, content: &str) -> TokenTable {
        match self {
            Self::Csv => parse_csv(content),
            Self::Ini => parse_ini(content),
        }
    }
}

/// A dictionary file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryFailure {
    /// File path.
    pub path: PathBuf,
    /// Failure description.
    pub reason: String,
}

/// Outcome of loading a dictionary directory.
#[derive(Debug, Clone, Default)]
pub struct DictionaryLoad {
    /// Merged token table.
    pub table: TokenTable,
    /// Files that were parsed, in load order.
    pub loaded: Vec<PathBuf>,
    /// Files that were skipped because they could not be read.
    pub failures: Vec<DictionaryFailure>,
}

/// Loads every `.csv` and `.ini` file in `dir` in lexicographic order.
///
/// A missing directory yields an empty result. Per-file failures are
/// collected and loading continues with the remaining files.
#[must_use]
pub fn load_dir(dir: &Path) -> DictionaryLoad {
    let mut load = DictionaryLoad::default();
    let Ok(entries) = fs::read_dir(dir) else {
        return load;
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    for path in files {
        let Some(format) = DictionaryFormat::from_path(&path) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(content) => {
                load.table.merge(format.parse(&content));
                load.loaded.push(path);
            }
            Err(err) => load.failures.push(DictionaryFailure {
                path,
                reason: err.to_string(),
            }),
        }
    }
    load
}
