//! Backup manager.
//!
//! Keeps at most one automatic, one manual and one restored copy per primary
//! key. Automatic snapshots are taken before primary data is overwritten and
//! must never block the primary write: their failures are logged and
//! swallowed.

use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::config::StoreConfig;
use crate::storage::keys::{self, KeyRole};
use crate::storage::validate::Violation;
use crate::storage::{KeyValueStore, entry_size};

/// Where a restorable backup was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupSource {
    Automatic,
    Manual,
}

impl std::fmt::Display for BackupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => f.write_str("automatic"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Presence and timestamps of the backups kept for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupStatus {
    pub has_auto: bool,
    pub has_manual: bool,
    pub has_restored: bool,
    pub last_saved: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct BackupManager<S> {
    store: Rc<S>,
    threshold: f64,
    probe_limit: usize,
    probe_chunk: usize,
}

impl<S> Clone for BackupManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            threshold: self.threshold,
            probe_limit: self.probe_limit,
            probe_chunk: self.probe_chunk,
        }
    }
}

impl<S: KeyValueStore> BackupManager<S> {
    pub fn new(store: Rc<S>, config: &StoreConfig) -> Self {
        Self {
            store,
            threshold: config.backup_threshold.clamp(0.0, 1.0),
            probe_limit: config.probe_limit_bytes,
            probe_chunk: config.probe_chunk_bytes.max(1),
        }
    }

    /// Copy `previous` (the value about to be overwritten) to the automatic
    /// backup slot of `key` and stamp the timestamp key. Returns whether the
    /// snapshot was stored.
    pub fn snapshot(&self, key: &str, previous: &str) -> bool {
        let backup_key = keys::backup_key(key);
        let needed = entry_size(&backup_key, previous);
        let available = self.estimate_available_space();
        if needed as f64 > available as f64 * self.threshold {
            log::info!(
                "backup of '{key}' needs {needed} bytes with ~{available} available; pruning stale keys"
            );
            let removed = self.prune_backups(Some(key)) + self.prune_stale_flags();
            log::debug!("pruned {removed} stale key(s) before snapshot of '{key}'");
        }

        if let Err(e) = self.store.set_item(&backup_key, previous) {
            log::warn!("failed to snapshot '{key}': {e}");
            return false;
        }
        self.stamp(key);
        true
    }

    /// Record the time of the most recent save of `key`.
    pub fn stamp(&self, key: &str) {
        let now = Utc::now().to_rfc3339();
        if let Err(e) = self.store.set_item(&keys::timestamp_key(key), &now) {
            log::warn!("failed to record save time of '{key}': {e}");
        }
    }

    /// Copy the current primary value of `key` to its manual backup slot.
    pub fn manual_backup(&self, key: &str) -> RepositoryResult<usize> {
        let current = self
            .store
            .get_item(key)?
            .ok_or_else(|| RepositoryError::BackupUnavailable(key.to_string()))?;
        let manual_key = keys::manual_backup_key(key);
        self.store.set_item(&manual_key, &current).map_err(|e| {
            log::error!("failed to write manual backup of '{key}': {e}");
            RepositoryError::from(e)
        })?;
        log::info!("manual backup of '{key}' stored ({} bytes)", current.len());
        Ok(current.len())
    }

    /// First backup of `key` that parses and passes `check`, preferring the
    /// automatic snapshot over the manual one.
    pub fn find_backup<T>(
        &self,
        key: &str,
        check: impl Fn(&Value) -> Result<T, Vec<Violation>>,
    ) -> Option<(T, String, BackupSource)> {
        let candidates = [
            (keys::backup_key(key), BackupSource::Automatic),
            (keys::manual_backup_key(key), BackupSource::Manual),
        ];
        for (backup_key, source) in candidates {
            let raw = match self.store.get_item(&backup_key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("failed to read backup '{backup_key}': {e}");
                    continue;
                }
            };
            let value: Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("backup '{backup_key}' is not valid JSON: {e}");
                    continue;
                }
            };
            match check(&value) {
                Ok(decoded) => return Some((decoded, raw, source)),
                Err(violations) => {
                    log::warn!(
                        "backup '{backup_key}' failed validation with {} violation(s)",
                        violations.len()
                    );
                }
            }
        }
        None
    }

    /// Keep a copy of what was restored into `key`.
    pub fn record_restored(&self, key: &str, raw: &str) {
        if let Err(e) = self.store.set_item(&keys::restored_backup_key(key), raw) {
            log::warn!("failed to keep restored copy of '{key}': {e}");
        }
    }

    pub fn status(&self, key: &str) -> RepositoryResult<BackupStatus> {
        let last_saved = self
            .store
            .get_item(&keys::timestamp_key(key))?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|ts| ts.with_timezone(&Utc));
        Ok(BackupStatus {
            has_auto: self.store.get_item(&keys::backup_key(key))?.is_some(),
            has_manual: self.store.get_item(&keys::manual_backup_key(key))?.is_some(),
            has_restored: self.store.get_item(&keys::restored_backup_key(key))?.is_some(),
            last_saved,
        })
    }

    /// Remove the manual and restored copies of `key`, keeping the automatic
    /// snapshot. Returns the number of keys removed.
    pub fn cleanup(&self, key: &str) -> RepositoryResult<usize> {
        let mut removed = 0;
        for stale in [keys::manual_backup_key(key), keys::restored_backup_key(key)] {
            if self.store.remove_item(&stale)? {
                removed += 1;
            }
        }
        log::info!("cleanup of '{key}' removed {removed} backup key(s)");
        Ok(removed)
    }

    /// Remove every backup in the store except the automatic snapshot of
    /// `keep`. Failures are logged; returns the number of keys removed.
    pub fn prune_backups(&self, keep: Option<&str>) -> usize {
        let all_keys = match self.store.keys() {
            Ok(all_keys) => all_keys,
            Err(e) => {
                log::warn!("failed to list keys for backup pruning: {e}");
                return 0;
            }
        };
        all_keys
            .iter()
            .filter(|key| {
                let role = keys::classify(key);
                role.is_backup() && !matches!(role, KeyRole::AutoBackup(base) if Some(base) == keep)
            })
            .filter(|key| self.remove_logged(key))
            .count()
    }

    /// Remove like flags that no longer mark a like.
    pub fn prune_stale_flags(&self) -> usize {
        let all_keys = match self.store.keys() {
            Ok(all_keys) => all_keys,
            Err(e) => {
                log::warn!("failed to list keys for flag pruning: {e}");
                return 0;
            }
        };
        all_keys
            .iter()
            .filter(|key| matches!(keys::classify(key), KeyRole::LikeFlag(_)))
            .filter(|key| !matches!(self.store.get_item(key), Ok(Some(value)) if value == "true"))
            .filter(|key| self.remove_logged(key))
            .count()
    }

    fn remove_logged(&self, key: &str) -> bool {
        match self.store.remove_item(key) {
            Ok(removed) => removed,
            Err(e) => {
                log::warn!("failed to remove '{key}': {e}");
                false
            }
        }
    }

    /// Remaining capacity: exact when the backend knows its quota, probed
    /// otherwise.
    pub fn estimate_available_space(&self) -> usize {
        match (self.store.quota_bytes(), self.store.used_bytes()) {
            (Some(quota), Ok(used)) => quota.saturating_sub(used),
            _ => self.probe_available_space(),
        }
    }

    /// Measure free space by storing growing dummy payloads until a write
    /// fails or the probe limit is reached. The probe key is always removed.
    pub fn probe_available_space(&self) -> usize {
        let mut size = self.probe_chunk.min(self.probe_limit);
        let mut largest = 0;
        while size > 0 && size <= self.probe_limit {
            let payload = "x".repeat(size);
            match self.store.set_item(keys::PROBE_KEY, &payload) {
                Ok(()) => largest = size,
                Err(_) => break,
            }
            if size == self.probe_limit {
                break;
            }
            size = size.saturating_mul(2).min(self.probe_limit);
        }
        if let Err(e) = self.store.remove_item(keys::PROBE_KEY) {
            log::warn!("failed to remove space probe: {e}");
        }
        log::debug!("space probe fits {largest} bytes");
        largest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn manager(store: MemoryStore) -> (Rc<MemoryStore>, BackupManager<MemoryStore>) {
        let store = Rc::new(store);
        let config = StoreConfig {
            probe_chunk_bytes: 16,
            probe_limit_bytes: 1024,
            ..StoreConfig::default()
        };
        (Rc::clone(&store), BackupManager::new(store, &config))
    }

    #[test]
    fn snapshot_writes_backup_and_timestamp() {
        let (store, backups) = manager(MemoryStore::new());
        assert!(backups.snapshot("mblog_concepts", "[]"));
        assert_eq!(
            store.get_item("mblog_concepts_backup").unwrap().as_deref(),
            Some("[]")
        );
        let status = backups.status("mblog_concepts").unwrap();
        assert!(status.has_auto);
        assert!(status.last_saved.is_some());
    }

    #[test]
    fn failed_snapshot_is_swallowed() {
        let (store, backups) = manager(MemoryStore::with_quota(40));
        let big = "y".repeat(100);
        assert!(!backups.snapshot("k", &big));
        assert_eq!(store.get_item("k_backup").unwrap(), None);
    }

    #[test]
    fn snapshot_prunes_stale_keys_when_space_is_tight() {
        let (store, backups) = manager(MemoryStore::with_quota(200));
        store.set_item("other_manual_backup", &"m".repeat(100)).unwrap();
        store.set_item("liked_3", "false").unwrap();
        store.set_item("liked_4", "true").unwrap();

        assert!(backups.snapshot("k", &"p".repeat(60)));

        assert_eq!(store.get_item("other_manual_backup").unwrap(), None);
        assert_eq!(store.get_item("liked_3").unwrap(), None);
        assert_eq!(store.get_item("liked_4").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn manual_backup_requires_primary() {
        let (store, backups) = manager(MemoryStore::new());
        assert_eq!(
            backups.manual_backup("k").unwrap_err(),
            RepositoryError::BackupUnavailable("k".to_string())
        );
        store.set_item("k", "[1]").unwrap();
        assert_eq!(backups.manual_backup("k").unwrap(), 3);
        assert_eq!(store.get_item("k_manual_backup").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn find_backup_falls_back_to_manual() {
        let (store, backups) = manager(MemoryStore::new());
        store.set_item("k_backup", "{broken").unwrap();
        store.set_item("k_manual_backup", "[1,2]").unwrap();

        let found = backups.find_backup("k", |value| {
            value.as_array().map(|a| a.len()).ok_or_else(Vec::new)
        });
        let (len, raw, source) = found.unwrap();
        assert_eq!(len, 2);
        assert_eq!(raw, "[1,2]");
        assert_eq!(source, BackupSource::Manual);
    }

    #[test]
    fn cleanup_keeps_automatic_snapshot() {
        let (store, backups) = manager(MemoryStore::new());
        store.set_item("k_backup", "[]").unwrap();
        store.set_item("k_manual_backup", "[]").unwrap();
        store.set_item("k_backup_restored", "[]").unwrap();

        assert_eq!(backups.cleanup("k").unwrap(), 2);
        assert!(store.get_item("k_backup").unwrap().is_some());
    }

    #[test]
    fn prune_backups_spares_the_kept_snapshot() {
        let (store, backups) = manager(MemoryStore::new());
        store.set_item("a_backup", "[]").unwrap();
        store.set_item("b_backup", "[]").unwrap();
        store.set_item("b_manual_backup", "[]").unwrap();
        store.set_item("a", "[]").unwrap();

        assert_eq!(backups.prune_backups(Some("a")), 2);
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "a_backup".to_string()]);
    }

    #[test]
    fn probe_stops_at_quota_and_cleans_up() {
        let (store, backups) = manager(MemoryStore::with_quota(100));
        let fits = backups.probe_available_space();
        // 16, 32 and 64 byte payloads fit next to the probe key; 128 does not.
        assert_eq!(fits, 64);
        assert_eq!(store.get_item(keys::PROBE_KEY).unwrap(), None);
    }

    #[test]
    fn probe_is_capped_by_limit() {
        let (_store, backups) = manager(MemoryStore::new());
        assert_eq!(backups.probe_available_space(), 1024);
    }
}
