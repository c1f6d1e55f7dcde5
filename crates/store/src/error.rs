//! Store error model.

use thiserror::Error;

/// Failures surfaced by a [`crate::repository::Repository`].
///
/// HTTP mapping lives in `app.rs`:
///
/// | Variant | Status |
/// |---|---|
/// | `Validation` | 400 |
/// | `NotFound` | 404 |
/// | `NotFoundOrForbidden` | 404 (fused on purpose) |
/// | `Conflict` | 409 |
/// | `Database` | 500 |
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested row does not exist.
    #[error("not found")]
    NotFound,

    /// The row does not exist or belongs to another principal. The two cases
    /// are indistinguishable so existence of foreign rows never leaks.
    #[error("not found or access denied")]
    NotFoundOrForbidden,

    /// Uniqueness conflict (duplicate username).
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}
