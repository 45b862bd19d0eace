//! Persistence errors.

use thiserror::Error;

/// Errors returned by persistence backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A generic backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Every retry attempt against the backend failed.
    #[error("Storage operation on '{key}' failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        key: String,
        attempts: u32,
        last: String,
    },
}
