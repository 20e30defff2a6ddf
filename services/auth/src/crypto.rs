//! Code generation and digest helpers.
//!
//! Two hash tiers on purpose: OTP codes get a fast SHA-256 digest (they are
//! short-lived and attempt-limited, so offline brute force of a dump is not
//! the threat model), passwords get bcrypt (long-lived credentials).

use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::error::AuthServiceError;

/// Default bcrypt work factor for password digests.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Draw a numeric one-time code of exactly `length` digits (no leading zero).
///
/// Uniform over `[10^(length-1), 10^length - 1]` from the thread-local
/// CSPRNG. `length` must be in 4..=9 — enforced at config load.
pub fn generate_code(length: u32) -> String {
    let mut rng = rand::rng();
    let low = 10u64.pow(length - 1);
    let high = 10u64.pow(length);
    rng.random_range(low..high).to_string()
}

/// Hex-encoded SHA-256 digest of an OTP code.
///
/// Deterministic: the same digest function serves storage and lookup, so a
/// leaked table exposes no active codes.
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// bcrypt digest for a password. `cost` comes from configuration
/// ([`DEFAULT_BCRYPT_COST`] unless overridden).
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthServiceError> {
    bcrypt::hash(password, cost).map_err(|e| AuthServiceError::Internal(e.into()))
}

/// Compare a candidate password against a stored bcrypt digest.
/// A malformed digest counts as a mismatch, not an error.
pub fn verify_password(password: &str, digest: &str) -> bool {
    bcrypt::verify(password, digest).unwrap_or(false)
}
