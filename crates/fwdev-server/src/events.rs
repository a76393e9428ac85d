// crates/fwdev-server/src/events.rs
// ============================================================================
// Module: Dev Server Events
// Description: Structured JSON-line events for injection and proxying.
// Purpose: Emit operational logs without a logging framework dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every notable action of the dev server is described by a [`DevEvent`]
//! and handed to a [`DevEventSink`]. Sinks serialize events as one JSON
//! object per line. The session token never appears in any event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use fwdev_config::LogSink;
use fwdev_config::LoggingConfig;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Normal operation.
    Info,
    /// Degraded operation; the request still completed.
    Warn,
    /// A request failed.
    Error,
}

/// Event-specific payload, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DevEventKind {
    /// FW context injected into a page.
    FwInjected {
        /// Original request path.
        path: String,
        /// Reconstructed prefix.
        prefix: String,
        /// Effective language.
        language: String,
    },
    /// Page served without a FW context.
    FwSkipped {
        /// Original request path.
        path: String,
        /// Why injection was skipped.
        reason: String,
    },
    /// Registry files merged and cached.
    RegistryCached {
        /// Number of merged keys.
        keys: usize,
        /// Whether a realm is configured.
        has_realm: bool,
    },
    /// Upstream realm snapshot cached.
    LookupCached {
        /// Realm identifier.
        realm: String,
        /// Number of supported languages.
        languages: usize,
    },
    /// Dictionary directory loaded.
    DictionaryLoaded {
        /// Number of files merged.
        files: usize,
        /// Number of distinct tokens.
        tokens: usize,
    },
    /// A dictionary file could not be read.
    DictionaryFileSkipped {
        /// File path.
        path: String,
        /// Failure reason.
        reason: String,
    },
    /// Version placeholder value resolved.
    VersionResolved {
        /// Version string.
        version: String,
        /// Where the version came from.
        source: &'static str,
    },
    /// Git version discovery failed; the fallback version is used.
    VersionFallback {
        /// Failure reason.
        reason: String,
    },
    /// API request proxied upstream.
    ProxyRequest {
        /// HTTP method.
        method: String,
        /// Canonical upstream path.
        path: String,
        /// Upstream status code.
        status: u16,
        /// Whether the body was translated.
        translated: bool,
        /// Whether the session token matched.
        csrf_valid: bool,
        /// Round-trip duration in milliseconds.
        duration_ms: u128,
    },
    /// API request failed before a response was received.
    ProxyFailed {
        /// HTTP method.
        method: String,
        /// Canonical upstream path.
        path: String,
        /// Failure message.
        message: String,
    },
    /// Listener bound.
    ServerStarted {
        /// Bound socket address.
        bind: String,
    },
}

/// Dev server event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevEvent {
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity.
    pub level: EventLevel,
    /// Event payload.
    #[serde(flatten)]
    pub kind: DevEventKind,
}

impl DevEvent {
    /// Builds an event stamped with the current time.
    #[must_use]
    pub fn new(level: EventLevel, kind: DevEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            timestamp_ms,
            level,
            kind,
        }
    }

    /// Builds an info-level event.
    #[must_use]
    pub fn info(kind: DevEventKind) -> Self {
        Self::new(EventLevel::Info, kind)
    }

    /// Builds a warn-level event.
    #[must_use]
    pub fn warn(kind: DevEventKind) -> Self {
        Self::new(EventLevel::Warn, kind)
    }

    /// Builds an error-level event.
    #[must_use]
    pub fn error(kind: DevEventKind) -> Self {
        Self::new(EventLevel::Error, kind)
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Event sink for dev server logging.
pub trait DevEventSink: Send + Sync {
    /// Records an event.
    fn record(&self, event: &DevEvent);
}

/// Shared event sink handle.
pub type SharedEventSink = Arc<dyn DevEventSink>;

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl DevEventSink for StderrEventSink {
    fn record(&self, event: &DevEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// Output file guarded for concurrent writers.
    file: Mutex<File>,
}

impl FileEventSink {
    /// Opens (or creates) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DevEventSink for FileEventSink {
    fn record(&self, event: &DevEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards events.
pub struct NoopEventSink;

impl DevEventSink for NoopEventSink {
    fn record(&self, _event: &DevEvent) {}
}

/// Builds the sink selected by the logging configuration.
///
/// # Errors
///
/// Returns [`io::Error`] when the file sink cannot be opened.
pub fn sink_from_config(config: &LoggingConfig) -> io::Result<SharedEventSink> {
    match config.sink {
        LogSink::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSink::None => Ok(Arc::new(NoopEventSink)),
        LogSink::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "logging.path is required")
            })?;
            Ok(Arc::new(FileEventSink::new(Path::new(path))?))
        }
    }
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
    fn event_serializes_flat_with_tag() {
        let event = DevEvent::warn(DevEventKind::FwSkipped {
            path: "/".to_string(),
            reason: "no realm".to_string(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "fw_skipped");
        assert_eq!(value["level"], "warn");
        assert_eq!(value["reason"], "no realm");
        assert!(value["timestamp_ms"].is_u64());
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let sink = FileEventSink::new(&path).unwrap();
        sink.record(&DevEvent::info(DevEventKind::ServerStarted {
            bind: "127.0.0.1:1".to_string(),
        }));
        sink.record(&DevEvent::info(DevEventKind::DictionaryLoaded {
            files: 1,
            tokens: 2,
        }));
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"event\":\"server_started\""));
        assert!(lines[1].contains("\"tokens\":2"));
    }
}
