// crates/fwdev-core/src/session.rs
// ============================================================================
// Module: Session Identity
// Description: Process-scoped session UUID and CSRF token.
// Purpose: Provide the stable identity echoed into pages and checked by the proxy.
// Dependencies: rand, subtle, uuid
// ============================================================================

//! ## Overview
//! A [`SessionIdentity`] is generated once per dev server instance and shared
//! read-only by every request handler. It is never request-scoped: the same
//! UUID and token are injected into every page until the process restarts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use uuid::Uuid;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of the generated CSRF token.
pub const CSRF_TOKEN_LENGTH: usize = 32;
/// Token lifetime advertised to the client (24 hours).
pub const TOKEN_LIFETIME_MS: u64 = 86_400_000;
/// Authorization scheme carrying the session token.
pub const SESSION_AUTH_SCHEME: &str = "Session";
/// Alphabet used for CSRF tokens.
const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// ============================================================================
// SECTION: Session Identity
// ============================================================================

/// Stable per-instance session identity.
#[derive(Clone)]
pub struct SessionIdentity {
    /// Session UUID.
    uuid: Uuid,
    /// CSRF token.
    token: String,
    /// Token expiry in milliseconds since the Unix epoch.
    token_exp_ms: u64,
}

impl SessionIdentity {
    /// Generates a fresh identity expiring [`TOKEN_LIFETIME_MS`] from now.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let token = (0..CSRF_TOKEN_LENGTH)
            .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
            .collect();
        Self {
            uuid: Uuid::new_v4(),
            token,
            token_exp_ms: now_ms().saturating_add(TOKEN_LIFETIME_MS),
        }
    }

    /// Builds an identity from known parts.
    #[must_use]
    pub fn from_parts(uuid: Uuid, token: impl Into<String>, token_exp_ms: u64) -> Self {
        Self {
            uuid,
            token: token.into(),
            token_exp_ms,
        }
    }

    /// Returns the session UUID.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the CSRF token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the token expiry in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn token_exp_ms(&self) -> u64 {
        self.token_exp_ms
    }

    /// Returns true when `header` is `Session <token>` carrying this token.
    #[must_use]
    pub fn matches_authorization(&self, header: &str) -> bool {
        let Some((scheme, credential)) = header.trim().split_once(' ') else {
            return false;
        };
        if scheme != SESSION_AUTH_SCHEME {
            return false;
        }
        bool::from(credential.trim().as_bytes().ct_eq(self.token.as_bytes()))
    }
}

impl fmt::Debug for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIdentity")
            .field("uuid", &self.uuid)
            .field("token", &"<redacted>")
            .field("token_exp_ms", &self.token_exp_ms)
            .finish()
    }
}

/// Returns the current time in milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}
