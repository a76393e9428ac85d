// crates/fwdev-server/src/lib.rs
// ============================================================================
// Module: fwdev Server Library
// Description: Dev server wiring for context injection and API proxying.
// Purpose: Serve a front-end locally as if it were rendered by production.
// Dependencies: axum, fwdev-config, fwdev-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! `fwdev-server` connects the pure pieces of `fwdev-core` to HTTP:
//! - [`synth::ContextSynthesizer`] caches the registry files and the upstream
//!   realm snapshot once, then injects a fresh FW context into every page.
//! - [`proxy::ApiProxy`] forwards `/_special/rest/` (and the `/_rest/` alias)
//!   to the upstream host, echoing session validity and translating
//!   `@token` markers in JSON responses.
//! - [`static_files::StaticSite`] serves assets and the SPA entry document.
//! - [`events`] carries structured JSON-line logging.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod events;
pub mod lookup;
pub mod proxy;
pub mod server;
pub mod static_files;
pub mod synth;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use events::DevEvent;
pub use events::DevEventSink;
pub use lookup::HttpRegistryLookup;
pub use lookup::LookupError;
pub use lookup::RegistryLookup;
pub use proxy::ApiProxy;
pub use proxy::canonical_api_path;
pub use server::DevServer;
pub use server::DevServerError;
pub use synth::ContextSynthesizer;
