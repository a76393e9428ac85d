// crates/fwdev-cli/src/lib.rs
// ============================================================================
// Module: fwdev CLI Library
// Description: Shared helpers for the `fwdev` binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! Library half of the `fwdev` CLI. User-facing strings live in [`i18n`] and
//! are rendered through the [`t!`] macro.

pub mod i18n;
