//! Transport-level error type.

use thiserror::Error;

/// Errors surfaced by a [`crate::KvBackend`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The backend could not be reached (connection failure or timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
