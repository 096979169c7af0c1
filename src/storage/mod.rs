//! Persistence adapter layer.
//!
//! [`KeyValueStore`] is the narrow, synchronous string-to-string store that
//! every repository goes through; concrete backends are the in-memory
//! [`MemoryStore`] and, with the `sqlite` feature, [`SqliteStore`].
//! [`PersistenceAdapter`] layers JSON encoding, shape validation, backups,
//! quota recovery and change notification on top.

use crate::error::StorageResult;

pub mod adapter;
pub mod keys;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod validate;

pub use adapter::PersistenceAdapter;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use validate::{Record, Violation};

/// Synchronous key-value store holding UTF-8 text values.
///
/// Mirrors the browser storage contract: last write wins, no transactions.
pub trait KeyValueStore {
    /// Fetch the raw value stored under `key`.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Insert or replace `key`. Fails with
    /// [`StorageError::QuotaExceeded`](crate::error::StorageError::QuotaExceeded)
    /// when the value does not fit.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Returns whether it existed.
    fn remove_item(&self, key: &str) -> StorageResult<bool>;

    /// All keys currently present, in ascending order.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Bytes currently used (keys plus values).
    fn used_bytes(&self) -> StorageResult<usize>;

    /// Configured capacity, when the backend knows it.
    fn quota_bytes(&self) -> Option<usize>;
}

/// Size a key/value pair is charged against the quota.
pub fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
