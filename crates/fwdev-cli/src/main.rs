// crates/fwdev-cli/src/main.rs
// ============================================================================
// Module: fwdev CLI Entry Point
// Description: Command dispatcher for the dev server and offline helpers.
// Purpose: Run the dev server and inspect dictionaries, prefixes, and config.
// Dependencies: clap, fwdev-config, fwdev-core, fwdev-server, serde_json, tokio
// ============================================================================

//! ## Overview
//! `fwdev` starts the local dev server and exposes the pure building blocks
//! (dictionary loading, token translation, prefix parsing, config validation)
//! as offline commands. All user-facing strings are routed through the
//! message catalog.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use fwdev_cli::t;
use fwdev_config::FwDevConfig;
use fwdev_core::FALLBACK_LANGUAGE;
use fwdev_core::TokenTable;
use fwdev_core::dictionary::is_language_code;
use fwdev_core::dictionary::load_dir;
use fwdev_core::parse_prefix;
use fwdev_core::translate;
use fwdev_server::DevServer;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a JSON document passed to `i18n translate`.
const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "fwdev", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dev server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Dictionary utilities.
    I18n {
        /// Selected dictionary subcommand.
        #[command(subcommand)]
        command: I18nCommand,
    },
    /// URL prefix utilities.
    Prefix {
        /// Selected prefix subcommand.
        #[command(subcommand)]
        command: PrefixCommand,
    },
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config file path (defaults to `FWDEV_CONFIG` or `fwdev.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path (defaults to `FWDEV_CONFIG` or `fwdev.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Dictionary subcommands.
#[derive(Subcommand, Debug)]
enum I18nCommand {
    /// Print the merged token table as JSON.
    Dump(I18nDumpCommand),
    /// Translate `@token` markers in a JSON document.
    Translate(I18nTranslateCommand),
}

/// Arguments for `i18n dump`.
#[derive(Args, Debug)]
struct I18nDumpCommand {
    /// Config file path used to locate the dictionary directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Dictionary directory (overrides the config).
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

/// Arguments for `i18n translate`.
#[derive(Args, Debug)]
struct I18nTranslateCommand {
    /// JSON document to translate.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Target language code.
    #[arg(long, value_name = "LANG")]
    lang: String,
    /// Config file path used to locate the dictionary directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Dictionary directory (overrides the config).
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
}

/// Prefix subcommands.
#[derive(Subcommand, Debug)]
enum PrefixCommand {
    /// Parse the context prefix of a URL path.
    Parse(PrefixParseCommand),
}

/// Arguments for `prefix parse`.
#[derive(Args, Debug)]
struct PrefixParseCommand {
    /// URL path to parse.
    path: String,
    /// Comma-separated supported languages (defaults to `en-US`).
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    languages: Vec<String>,
}

/// CLI error wrapper with a rendered message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a rendered message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate(command) => command_config_validate(&command),
        },
        Commands::I18n {
            command,
        } => match command {
            I18nCommand::Dump(command) => command_i18n_dump(&command),
            I18nCommand::Translate(command) => command_i18n_translate(&command),
        },
        Commands::Prefix {
            command,
        } => match command {
            PrefixCommand::Parse(command) => command_prefix_parse(&command),
        },
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(help.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let banner =
        t!("serve.listening", bind = config.server.bind.trim(), upstream = config.upstream.base());
    let server = tokio::task::spawn_blocking(move || DevServer::from_config(config))
        .await
        .map_err(|err| {
            CliError::new(t!("serve.init_failed", error = format!("init join failed: {err}")))
        })?
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    write_stderr_line(&banner).map_err(|err| CliError::new(output_error("stderr", &err)))?;
    server.serve().await.map_err(|err| CliError::new(t!("serve.failed", error = err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates the config file.
fn load_config(path: Option<&Path>) -> CliResult<FwDevConfig> {
    FwDevConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Dictionary Commands
// ============================================================================

/// Executes `i18n dump`.
fn command_i18n_dump(command: &I18nDumpCommand) -> CliResult<ExitCode> {
    let table = load_table(command.dir.as_deref(), command.config.as_deref())?;
    write_json(&table)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `i18n translate`.
fn command_i18n_translate(command: &I18nTranslateCommand) -> CliResult<ExitCode> {
    let language = command.lang.trim();
    if !is_language_code(language) {
        return Err(CliError::new(t!("i18n.lang.invalid", value = language)));
    }
    let table = load_table(command.dir.as_deref(), command.config.as_deref())?;
    let input = read_json_input(&command.input)?;
    write_json(&translate(&input, &table, language))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads the dictionary from `dir`, or from the configured directory.
fn load_table(dir: Option<&Path>, config: Option<&Path>) -> CliResult<TokenTable> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => load_config(config)?.i18n_dir(),
    };
    let load = load_dir(&dir);
    for failure in &load.failures {
        write_stderr_line(&t!(
            "i18n.file_skipped",
            path = failure.path.display(),
            reason = failure.reason
        ))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(load.table)
}

/// Reads a JSON document with a size limit.
fn read_json_input(path: &Path) -> CliResult<Value> {
    let shown = path.display();
    let size = fs::metadata(path)
        .map_err(|err| CliError::new(t!("input.read_failed", path = shown, error = err)))?
        .len();
    if size > MAX_INPUT_BYTES {
        return Err(CliError::new(t!(
            "input.read_too_large",
            path = shown,
            size = size,
            limit = MAX_INPUT_BYTES
        )));
    }
    let bytes = fs::read(path)
        .map_err(|err| CliError::new(t!("input.read_failed", path = shown, error = err)))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(t!("input.parse_failed", path = shown, error = err)))
}

// ============================================================================
// SECTION: Prefix Commands
// ============================================================================

/// Executes `prefix parse`.
fn command_prefix_parse(command: &PrefixParseCommand) -> CliResult<ExitCode> {
    let languages = parse_languages(&command.languages)?;
    let parsed = parse_prefix(&command.path, &languages);
    write_json(&parsed)?;
    Ok(ExitCode::SUCCESS)
}

/// Normalizes the `--languages` list, defaulting to the fallback language.
fn parse_languages(raw: &[String]) -> CliResult<Vec<String>> {
    let mut languages = Vec::new();
    for entry in raw.iter().map(|entry| entry.trim()).filter(|entry| !entry.is_empty()) {
        if !is_language_code(entry) {
            return Err(CliError::new(t!("prefix.languages.invalid", value = entry)));
        }
        languages.push(entry.to_string());
    }
    if languages.is_empty() {
        languages.push(FALLBACK_LANGUAGE.to_string());
    }
    Ok(languages)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON to stdout.
fn write_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(t!("i18n.render_failed", error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
