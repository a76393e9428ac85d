// crates/fwdev-core/src/lib.rs
// ============================================================================
// Module: fwdev Core
// Description: Request-context and i18n logic for the front-end dev server.
// Purpose: Keep parsing, synthesis, and translation pure and testable.
// Dependencies: rand, serde, serde_json, subtle, thiserror, url, uuid
// ============================================================================

//! ## Overview
//! `fwdev-core` holds the pure pieces of the dev server: registry and
//! dictionary loaders, the URL prefix parser, FW context synthesis, and the
//! `@token` translator. Nothing here performs network I/O; the server crate
//! wires these pieces to HTTP.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod dictionary;
pub mod prefix;
pub mod registry;
pub mod session;
pub mod translate;
pub mod version;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::FwContext;
pub use context::HostInfo;
pub use context::SynthesisInputs;
pub use context::UrlLookupData;
pub use context::UrlLookupEnvelope;
pub use context::inject_script;
pub use dictionary::DictionaryLoad;
pub use dictionary::FALLBACK_LANGUAGE;
pub use dictionary::TokenTable;
pub use prefix::ParsedPrefix;
pub use prefix::parse_prefix;
pub use registry::RegistryConfig;
pub use session::SessionIdentity;
pub use translate::translate;
