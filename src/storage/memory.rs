use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::{StorageError, StorageResult};
use crate::storage::{KeyValueStore, entry_size};

/// In-memory store with an optional simulated quota.
///
/// Single-threaded like the browser storage it stands in for. Counts
/// `set_item` calls so tests can observe write amplification.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Option<usize>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys plus values exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.borrow_mut();
        if let Some(quota) = self.quota {
            let used: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map_or(0, |old| entry_size(key, old));
            let available = quota.saturating_sub(used - replaced);
            let requested = entry_size(key, value);
            if requested > available {
                return Err(StorageError::QuotaExceeded {
                    requested,
                    available,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<bool> {
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.borrow().keys().cloned().collect())
    }

    fn used_bytes(&self) -> StorageResult<usize> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum())
    }

    fn quota_bytes(&self) -> Option<usize> {
        self.quota
    }
}
