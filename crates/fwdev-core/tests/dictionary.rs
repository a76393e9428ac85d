// crates/fwdev-core/tests/dictionary.rs
// ============================================================================
// Module: Dictionary Loader Tests
// Description: CSV/INI dictionary parsing and directory merge behavior.
// Purpose: Ensure token tables merge pairwise and tolerate bad inputs.
// Dependencies: fwdev-core, tempfile
// ============================================================================

//! ## Overview
//! Exercises both dictionary formats, layout auto-detection for INI files,
//! lexicographic merge order, and fail-soft directory loading.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use fwdev_core::dictionary::DictionaryFormat;
use fwdev_core::dictionary::is_language_code;
use fwdev_core::dictionary::load_dir;
use fwdev_core::dictionary::parse_csv;
use fwdev_core::dictionary::parse_ini;

// ============================================================================
// SECTION: CSV
// ============================================================================

/// The header maps columns to languages positionally.
#[test]
fn csv_maps_header_languages() {
    let table = parse_csv("token,en-US,fr-FR\nhello,Hello,Bonjour\n");
    let hello = table.languages("hello").unwrap();
    assert_eq!(hello.get("en-US").map(String::as_str), Some("Hello"));
    assert_eq!(hello.get("fr-FR").map(String::as_str), Some("Bonjour"));
    assert_eq!(hello.len(), 2);
}

/// Blank cells leave the language unset instead of storing an empty string.
#[test]
fn csv_skips_blank_values() {
    let table = parse_csv("token,en-US,fr-FR\nbye,Goodbye,  \n");
    assert_eq!(table.get("bye", "en-US"), Some("Goodbye"));
    assert!(table.get("bye", "fr-FR").is_none());
}

/// Rows with an empty token are skipped.
#[test]
fn csv_skips_rows_without_token() {
    let table = parse_csv("token,en-US\n ,Orphan\nok,Fine\n");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get("ok", "en-US"), Some("Fine"));
}

/// Quoted cells may contain commas and escaped quotes.
#[test]
fn csv_handles_quoted_cells() {
    let table = parse_csv(
        "token,en-US,fr-FR\r\nlist,\"One, two\",\"Il a dit \"\"oui\"\"\"\r\n",
    );
    assert_eq!(table.get("list", "en-US"), Some("One, two"));
    assert_eq!(table.get("list", "fr-FR"), Some("Il a dit \"oui\""));
}

/// Short rows only fill the languages they cover.
#[test]
fn csv_short_rows_fill_leading_languages() {
    let table = parse_csv("token,en-US,fr-FR,de-DE\nyes,Yes\n");
    assert_eq!(table.get("yes", "en-US"), Some("Yes"));
    assert!(table.get("yes", "de-DE").is_none());
}

// ============================================================================
// SECTION: INI
// ============================================================================

/// `[xx-XX]` sections register `token = value` lines for that language.
#[test]
fn ini_language_sections() {
    let table = parse_ini("[en-US]\nhello = Hello\n\n[fr-FR]\nhello = Bonjour\n");
    assert_eq!(table.get("hello", "en-US"), Some("Hello"));
    assert_eq!(table.get("hello", "fr-FR"), Some("Bonjour"));
}

/// Other sections register `language = value` lines for that token.
#[test]
fn ini_token_sections() {
    let table = parse_ini("[greeting]\nen-US = Hi\nja-JP = \"こんにちは\"\n");
    assert_eq!(table.get("greeting", "en-US"), Some("Hi"));
    assert_eq!(table.get("greeting", "ja-JP"), Some("こんにちは"));
}

/// Both layouts may be mixed in one file; comments and preamble are ignored.
#[test]
fn ini_mixed_layouts_and_comments() {
    let content = "\
orphan = ignored
; comment
# another comment
[en-US]
save = Save
[save]
fr-FR = Enregistrer
";
    let table = parse_ini(content);
    assert!(table.languages("orphan").is_none());
    assert_eq!(table.get("save", "en-US"), Some("Save"));
    assert_eq!(table.get("save", "fr-FR"), Some("Enregistrer"));
}

/// The language shape check is purely positional.
#[test]
fn language_code_shape() {
    assert!(is_language_code("en-US"));
    assert!(is_language_code("zz-99"));
    assert!(!is_language_code("en_US"));
    assert!(!is_language_code("en-USA"));
    assert!(!is_language_code("greeting"));
}

// ============================================================================
// SECTION: Directory Loading
// ============================================================================

/// A missing directory yields an empty table.
#[test]
fn missing_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let load = load_dir(&dir.path().join("i18n"));
    assert!(load.table.is_empty());
    assert!(load.loaded.is_empty());
}

/// Later files overwrite only the pairs they define.
#[test]
fn later_files_override_pairs_only() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a_base.csv"), "token,en-US,fr-FR\nhello,Hello,Bonjour\n").unwrap();
    fs::write(dir.path().join("b_override.ini"), "[hello]\nfr-FR = Salut\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "hello,ignored\n").unwrap();

    let load = load_dir(dir.path());
    assert_eq!(load.loaded.len(), 2);
    assert_eq!(load.table.get("hello", "en-US"), Some("Hello"));
    assert_eq!(load.table.get("hello", "fr-FR"), Some("Salut"));
}

/// Unreadable files are reported and the rest still load.
#[test]
fn unreadable_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.csv"), [0xff, 0xfe, 0x00, 0x01]).unwrap();
    fs::write(dir.path().join("b.csv"), "token,en-US\nok,Fine\n").unwrap();

    let load = load_dir(dir.path());
    assert_eq!(load.failures.len(), 1);
    assert!(load.failures[0].path.ends_with("a.csv"));
    assert_eq!(load.table.get("ok", "en-US"), Some("Fine"));
}

/// Format detection ignores extension case.
#[test]
fn format_detection_is_case_insensitive() {
    assert_eq!(
        DictionaryFormat::from_path(std::path::Path::new("x/Strings.CSV")),
        Some(DictionaryFormat::Csv)
    );
    assert_eq!(
        DictionaryFormat::from_path(std::path::Path::new("x/strings.ini")),
        Some(DictionaryFormat::Ini)
    );
    assert_eq!(DictionaryFormat::from_path(std::path::Path::new("x/strings.json")), None);
}
