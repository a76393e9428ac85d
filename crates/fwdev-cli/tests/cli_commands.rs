// crates/fwdev-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests running the `fwdev` binary.
// Purpose: Ensure offline commands print the expected output and fail closed.
// Dependencies: fwdev-cli binary
// ============================================================================

//! ## Overview
//! Runs the built `fwdev` binary against temporary dictionaries, documents,
//! and config files.

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
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Path to the built binary.
fn fwdev_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fwdev"))
}

/// Runs the binary in `cwd` with `args`.
fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(fwdev_bin())
        .current_dir(cwd)
        .env_remove("FWDEV_CONFIG")
        .args(args)
        .output()
        .expect("run fwdev")
}

/// Parses stdout as JSON.
fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

/// Writes a two-language dictionary under `dir/i18n`.
fn write_dictionary(dir: &Path) -> PathBuf {
    let i18n = dir.join("i18n");
    fs::create_dir_all(&i18n).unwrap();
    fs::write(i18n.join("a.csv"), "token,en-US,fr-FR\ngreeting,Hello,Bonjour\n").unwrap();
    fs::write(i18n.join("b.ini"), "[fr-FR]\nfarewell=Au revoir\n").unwrap();
    i18n
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies `--version` prints the binary name and package version.
#[test]
fn version_flag_prints_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("fwdev {}", env!("CARGO_PKG_VERSION")));
}

/// Verifies `config validate` accepts defaults when no file exists.
#[test]
fn config_validate_accepts_missing_default_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["config", "validate"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Config valid.");
}

/// Verifies `config validate` rejects invalid settings.
#[test]
fn config_validate_rejects_bad_upstream() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[upstream]\nbase_url = \"ftp://example.com\"\n").unwrap();
    let output = run(dir.path(), &["config", "validate", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Failed to load config"), "unexpected stderr: {stderr}");
}

/// Verifies `i18n dump` prints the merged table.
#[test]
fn i18n_dump_prints_merged_table() {
    let dir = tempfile::tempdir().unwrap();
    let i18n = write_dictionary(dir.path());
    let output = run(dir.path(), &["i18n", "dump", "--dir", i18n.to_str().unwrap()]);
    assert!(output.status.success());
    let table = stdout_json(&output);
    assert_eq!(table["greeting"]["fr-FR"], "Bonjour");
    assert_eq!(table["greeting"]["en-US"], "Hello");
    assert_eq!(table["farewell"]["fr-FR"], "Au revoir");
}

/// Verifies `i18n translate` replaces markers for the requested language.
#[test]
fn i18n_translate_rewrites_document() {
    let dir = tempfile::tempdir().unwrap();
    let i18n = write_dictionary(dir.path());
    let input = dir.path().join("doc.json");
    fs::write(
        &input,
        r#"{"items":[{"@token":["greeting"]},{"@token":["farewell"]},{"@token":["unknown"]}]}"#,
    )
    .unwrap();
    let output = run(dir.path(), &[
        "i18n",
        "translate",
        "--input",
        input.to_str().unwrap(),
        "--lang",
        "fr-FR",
        "--dir",
        i18n.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({"items": ["Bonjour", "Au revoir", "[missing token: unknown]"]})
    );
}

/// Verifies `i18n translate` rejects malformed language codes.
#[test]
fn i18n_translate_rejects_bad_language() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(&input, "{}").unwrap();
    let output = run(dir.path(), &[
        "i18n",
        "translate",
        "--input",
        input.to_str().unwrap(),
        "--lang",
        "french",
        "--dir",
        dir.path().to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("french"));
}

/// Verifies `prefix parse` prints the parsed context.
#[test]
fn prefix_parse_prints_context() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &[
        "prefix",
        "parse",
        "/l/en-US/c/USD/products/42",
        "--languages",
        "en-US,fr-FR",
    ]);
    assert!(output.status.success());
    let parsed = stdout_json(&output);
    assert_eq!(parsed["prefix"], "/l/en-US/c/USD");
    assert_eq!(parsed["context"], json!({"c": "USD", "l": "en-US"}));
    assert_eq!(parsed["remaining_path"], "/products/42");
}

/// Verifies unsupported locales stop prefix parsing.
#[test]
fn prefix_parse_stops_at_unknown_locale() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["prefix", "parse", "/l/de-DE/x"]);
    assert!(output.status.success());
    let parsed = stdout_json(&output);
    assert_eq!(parsed["prefix"], "");
    assert_eq!(parsed["remaining_path"], "/l/de-DE/x");
}
