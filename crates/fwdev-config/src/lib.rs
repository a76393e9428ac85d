// crates/fwdev-config/src/lib.rs
// ============================================================================
// Module: fwdev Config Library
// Description: Canonical dev server config model and validation.
// Purpose: Single source of truth for fwdev.toml semantics.
// Dependencies: fwdev-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `fwdev-config` defines the `fwdev.toml` model consumed by the dev server
//! and CLI. Loading is strict and fail-closed; every section has defaults so
//! an empty file (or no file at all) yields a working local setup.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
