//! Password hashing and verification.
//!
//! bcrypt with a tunable work factor. The default cost of 12 targets roughly
//! 400 ms per hash on commodity hardware; callers must not hold shared locks
//! while hashing.

use thiserror::Error;

/// Default bcrypt work factor.
pub const DEFAULT_COST: u32 = 12;

/// bcrypt's native input limit. Longer plaintexts would be silently
/// truncated by the algorithm, so we reject them instead.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Plaintext exceeds the algorithm's input limit. Surface as a
    /// client-side validation failure.
    #[error("password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    /// The hashing backend failed (invalid cost, RNG failure).
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password with the default work factor.
///
/// Empty plaintext is permitted here; the minimum-length policy belongs to
/// the registration handler.
pub fn hash(plaintext: &str) -> Result<String, PasswordError> {
    hash_with_cost(plaintext, DEFAULT_COST)
}

/// Hash with an explicit work factor (tests use a low cost).
pub fn hash_with_cost(plaintext: &str, cost: u32) -> Result<String, PasswordError> {
    if plaintext.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    bcrypt::hash(plaintext, cost).map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a plaintext against a stored digest.
///
/// Comparison is constant-time against the digest and case-sensitive on the
/// plaintext. A malformed digest verifies as false.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(plaintext, digest).unwrap_or(false)
}
