//! Error types for the storage and repository layers.

use thiserror::Error;

/// Failures reported by a [`KeyValueStore`](crate::storage::KeyValueStore)
/// backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The write would push the store past its quota.
    #[error("quota exceeded: {requested} bytes requested, {available} bytes available")]
    QuotaExceeded { requested: usize, available: usize },
    /// Any other backend failure (connection, I/O, SQL).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by repositories and the persistence adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Decoded data failed shape validation.
    #[error("schema validation failed: {}", .0.join("; "))]
    SchemaInvalid(Vec<String>),
    /// Stored text is not valid JSON.
    #[error("data corrupted: {0}")]
    DataCorrupted(String),
    /// The write still did not fit after cleanup.
    #[error("storage full while writing '{key}' ({bytes} bytes)")]
    StorageFull { key: String, bytes: usize },
    #[error("not found")]
    NotFound,
    /// Restore was requested but no valid backup exists.
    #[error("no usable backup for '{0}'")]
    BackupUnavailable(String),
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// Input rejected before touching storage.
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::DataCorrupted(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

pub type RepositoryResult<T> = Result<T, RepositoryError>;
