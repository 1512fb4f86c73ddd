//! Error types raised by storage backends.

use thiserror::Error;

/// Errors surfaced by key/value storage backends.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The write would exceed the backend's quota. Callers recover by
    /// shrinking what they store and retrying.
    #[error("storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("storage lock was poisoned")]
    LockPoisoned,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Is this the recoverable quota condition?
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
