//! Persistence adapter: JSON read-through and write-back over a
//! [`KeyValueStore`].
//!
//! Reads never fail on bad data. An absent key is seeded with defaults, an
//! undecodable or invalid value is recovered from a backup and, failing that,
//! replaced by defaults in the returned value. Writes validate, snapshot the
//! previous value, store with quota recovery and finally notify subscribers.

use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::backup::BackupManager;
use crate::error::{RepositoryError, RepositoryResult, StorageError};
use crate::events::{EventBus, StoreEvent, Topic};
use crate::models::config::StoreConfig;
use crate::storage::KeyValueStore;
use crate::storage::validate::{
    Record, Violation, describe, validate_collection, validate_document, validate_outgoing,
};

#[derive(Debug)]
pub struct PersistenceAdapter<S> {
    store: Rc<S>,
    backups: BackupManager<S>,
    bus: EventBus,
}

impl<S> Clone for PersistenceAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            backups: self.backups.clone(),
            bus: self.bus.clone(),
        }
    }
}

fn parse(raw: &str) -> RepositoryResult<Value> {
    Ok(serde_json::from_str(raw)?)
}

fn schema_error(violations: Vec<Violation>) -> RepositoryError {
    RepositoryError::SchemaInvalid(describe(&violations))
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(store: S, config: &StoreConfig, bus: EventBus) -> Self {
        let store = Rc::new(store);
        let backups = BackupManager::new(Rc::clone(&store), config);
        Self {
            store,
            backups,
            bus,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn backups(&self) -> &BackupManager<S> {
        &self.backups
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Read a collection, seeding `key` with `defaults` when absent.
    pub fn read_collection<T: Record>(
        &self,
        key: &str,
        defaults: impl FnOnce() -> Vec<T>,
    ) -> RepositoryResult<Vec<T>> {
        let Some(raw) = self.store.get_item(key)? else {
            let seeded = defaults();
            if let Err(e) = self.persist_collection(key, &seeded) {
                log::warn!("failed to seed '{key}' with defaults: {e}");
            }
            return Ok(seeded);
        };

        match decode_collection::<T>(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                log::warn!("stored '{key}' is unusable ({e}); attempting recovery");
                match self.recover(key, validate_collection::<T>, |items| {
                    self.persist_collection(key, items)
                }) {
                    Some(items) => Ok(items),
                    None => {
                        log::error!("no usable backup for '{key}'; falling back to defaults");
                        Ok(defaults())
                    }
                }
            }
        }
    }

    /// Read a singleton document, seeding `key` with `default` when absent.
    pub fn read_document<T: Record>(
        &self,
        key: &str,
        default: impl FnOnce() -> T,
    ) -> RepositoryResult<T> {
        let Some(raw) = self.store.get_item(key)? else {
            let seeded = default();
            if let Err(e) = self.persist_document(key, &seeded) {
                log::warn!("failed to seed '{key}' with defaults: {e}");
            }
            return Ok(seeded);
        };

        match decode_document::<T>(&raw) {
            Ok(document) => Ok(document),
            Err(e) => {
                log::warn!("stored '{key}' is unusable ({e}); attempting recovery");
                match self.recover(key, validate_document::<T>, |document| {
                    self.persist_document(key, document)
                }) {
                    Some(document) => Ok(document),
                    None => {
                        log::error!("no usable backup for '{key}'; falling back to defaults");
                        Ok(default())
                    }
                }
            }
        }
    }

    /// Validate, back up, store and broadcast a collection.
    pub fn save_collection<T: Record>(
        &self,
        key: &str,
        topic: Topic,
        items: &[T],
    ) -> RepositoryResult<()> {
        self.persist_collection(key, items)?;
        self.broadcast(key, topic, items);
        Ok(())
    }

    /// Validate, back up, store and broadcast a singleton document.
    pub fn save_document<T: Record>(
        &self,
        key: &str,
        topic: Topic,
        document: &T,
    ) -> RepositoryResult<()> {
        self.persist_document(key, document)?;
        self.broadcast(key, topic, document);
        Ok(())
    }

    /// Same as [`save_collection`](Self::save_collection) without notifying.
    pub fn persist_collection<T: Record>(&self, key: &str, items: &[T]) -> RepositoryResult<()> {
        validate_outgoing(items).map_err(schema_error)?;
        let payload = serde_json::to_string(items)?;
        self.write_payload(key, &payload, |previous| {
            validate_collection::<T>(previous).is_ok()
        })
    }

    /// Same as [`save_document`](Self::save_document) without notifying.
    pub fn persist_document<T: Record>(&self, key: &str, document: &T) -> RepositoryResult<()> {
        validate_outgoing(std::slice::from_ref(document)).map_err(schema_error)?;
        let payload = serde_json::to_string(document)?;
        self.write_payload(key, &payload, |previous| {
            validate_document::<T>(previous).is_ok()
        })
    }

    /// Replace `key` with its newest valid backup and broadcast the result.
    ///
    /// The restore goes through the regular write path, so the value it
    /// replaces becomes the new automatic backup.
    pub fn restore_collection<T: Record>(&self, key: &str, topic: Topic) -> RepositoryResult<Vec<T>> {
        let (items, raw, source) = self
            .backups
            .find_backup(key, validate_collection::<T>)
            .ok_or_else(|| RepositoryError::BackupUnavailable(key.to_string()))?;
        self.save_collection(key, topic, &items)?;
        self.backups.record_restored(key, &raw);
        log::info!("restored '{key}' from {source} backup ({} records)", items.len());
        Ok(items)
    }

    pub fn restore_document<T: Record>(&self, key: &str, topic: Topic) -> RepositoryResult<T> {
        let (document, raw, source) = self
            .backups
            .find_backup(key, validate_document::<T>)
            .ok_or_else(|| RepositoryError::BackupUnavailable(key.to_string()))?;
        self.save_document(key, topic, &document)?;
        self.backups.record_restored(key, &raw);
        log::info!("restored '{key}' from {source} backup");
        Ok(document)
    }

    /// Raw text stored under `key`.
    pub fn raw(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self.store.get_item(key)?)
    }

    pub fn keys(&self) -> RepositoryResult<Vec<String>> {
        Ok(self.store.keys()?)
    }

    /// Boolean flag stored as `"true"`; anything else reads as unset.
    pub fn flag(&self, key: &str) -> RepositoryResult<bool> {
        Ok(self.store.get_item(key)?.as_deref() == Some("true"))
    }

    pub fn set_flag(&self, key: &str, value: bool) -> RepositoryResult<()> {
        self.store_with_cleanup(key, if value { "true" } else { "false" })
    }

    pub fn remove(&self, key: &str) -> RepositoryResult<bool> {
        Ok(self.store.remove_item(key)?)
    }

    fn recover<T>(
        &self,
        key: &str,
        check: impl Fn(&Value) -> Result<T, Vec<Violation>>,
        persist: impl FnOnce(&T) -> RepositoryResult<()>,
    ) -> Option<T> {
        let (recovered, raw, source) = self.backups.find_backup(key, check)?;
        if let Err(e) = persist(&recovered) {
            log::error!("recovered '{key}' from {source} backup but could not re-persist: {e}");
        } else {
            self.backups.record_restored(key, &raw);
            log::info!("recovered '{key}' from {source} backup");
        }
        Some(recovered)
    }

    fn write_payload(
        &self,
        key: &str,
        payload: &str,
        previous_is_valid: impl Fn(&Value) -> bool,
    ) -> RepositoryResult<()> {
        if let Some(previous) = self.store.get_item(key)? {
            let usable = serde_json::from_str::<Value>(&previous)
                .map(|value| previous_is_valid(&value))
                .unwrap_or(false);
            if !usable {
                log::warn!("not backing up '{key}': previous value is corrupt");
            } else if previous != payload {
                self.backups.snapshot(key, &previous);
            }
        }

        self.store_with_cleanup(key, payload)?;
        self.backups.stamp(key);
        Ok(())
    }

    /// Store `payload`, pruning old backups and then stale like flags when
    /// the quota is hit.
    fn store_with_cleanup(&self, key: &str, payload: &str) -> RepositoryResult<()> {
        let stages: [(&str, &dyn Fn() -> usize); 2] = [
            ("old backups", &|| self.backups.prune_backups(Some(key))),
            ("stale like flags", &|| self.backups.prune_stale_flags()),
        ];

        let mut attempt = self.store.set_item(key, payload);
        for (label, prune) in stages {
            match attempt {
                Err(StorageError::QuotaExceeded {
                    requested,
                    available,
                }) => {
                    log::warn!(
                        "writing '{key}' needs {requested} bytes, {available} available; removing {label}"
                    );
                    let removed = prune();
                    log::info!("removed {removed} key(s) ({label})");
                    attempt = self.store.set_item(key, payload);
                }
                _ => break,
            }
        }

        match attempt {
            Ok(()) => Ok(()),
            Err(StorageError::QuotaExceeded { .. }) => {
                log::error!("storage full: could not write '{key}' after cleanup");
                Err(RepositoryError::StorageFull {
                    key: key.to_string(),
                    bytes: payload.len(),
                })
            }
            Err(e) => {
                log::error!("failed to write '{key}': {e}");
                Err(e.into())
            }
        }
    }

    fn broadcast<T: Serialize + ?Sized>(&self, key: &str, topic: Topic, value: &T) {
        let items = match serde_json::to_value(value) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("failed to encode change notification for '{key}': {e}");
                Value::Null
            }
        };
        self.bus.publish(
            topic,
            &StoreEvent::Updated {
                key: key.to_string(),
                items,
            },
        );
        self.bus.publish(
            Topic::StorageChanged,
            &StoreEvent::StorageChanged {
                key: key.to_string(),
            },
        );
    }
}

pub fn decode_collection<T: Record>(raw: &str) -> RepositoryResult<Vec<T>> {
    let value = parse(raw)?;
    validate_collection(&value).map_err(schema_error)
}

pub fn decode_document<T: Record>(raw: &str) -> RepositoryResult<T> {
    let value = parse(raw)?;
    validate_document(&value).map_err(schema_error)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::domain::category::{Category, default_categories};
    use crate::domain::site::GtmConfig;
    use crate::storage::MemoryStore;
    use crate::storage::keys::CATEGORIES_KEY;

    fn adapter(store: MemoryStore) -> PersistenceAdapter<MemoryStore> {
        PersistenceAdapter::new(store, &StoreConfig::default(), EventBus::new())
    }

    #[test]
    fn absent_key_is_seeded() {
        let adapter = adapter(MemoryStore::new());
        let categories: Vec<Category> = adapter
            .read_collection(CATEGORIES_KEY, default_categories)
            .unwrap();
        assert_eq!(categories.len(), 4);
        assert!(adapter.raw(CATEGORIES_KEY).unwrap().is_some());
    }

    #[test]
    fn corrupt_value_without_backup_yields_defaults_and_is_left_alone() {
        let store = MemoryStore::new();
        store.set_item(CATEGORIES_KEY, "{not json").unwrap();
        let adapter = adapter(store);

        let categories: Vec<Category> = adapter
            .read_collection(CATEGORIES_KEY, default_categories)
            .unwrap();

        assert_eq!(categories, default_categories());
        assert_eq!(adapter.raw(CATEGORIES_KEY).unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn save_snapshots_previous_value() {
        let adapter = adapter(MemoryStore::new());
        let mut categories = default_categories();
        adapter
            .save_collection(CATEGORIES_KEY, Topic::Categories, &categories)
            .unwrap();
        categories.pop();
        adapter
            .save_collection(CATEGORIES_KEY, Topic::Categories, &categories)
            .unwrap();

        let backup = adapter.raw("mblog_categories_backup").unwrap().unwrap();
        let backed_up: Vec<Category> = decode_collection(&backup).unwrap();
        assert_eq!(backed_up.len(), 4);
        assert!(adapter.raw("mblog_categories_timestamp").unwrap().is_some());
    }

    #[test]
    fn save_rejects_invalid_records() {
        let adapter = adapter(MemoryStore::new());
        let gtm = GtmConfig {
            enabled: true,
            container_id: None,
        };
        let err = adapter.save_document("mblog_gtm_config", Topic::Gtm, &gtm).unwrap_err();
        assert!(matches!(err, RepositoryError::SchemaInvalid(_)));
        assert_eq!(adapter.raw("mblog_gtm_config").unwrap(), None);
    }

    #[test]
    fn save_publishes_specific_then_generic_notification() {
        let adapter = adapter(MemoryStore::new());
        let log = std::rc::Rc::new(RefCell::new(Vec::new()));

        let sink = std::rc::Rc::clone(&log);
        adapter.bus().subscribe(Topic::Gtm, move |event| {
            sink.borrow_mut().push(format!("gtm:{}", event.key()))
        });
        let sink = std::rc::Rc::clone(&log);
        adapter.bus().subscribe(Topic::StorageChanged, move |event| {
            sink.borrow_mut().push(format!("any:{}", event.key()))
        });

        adapter
            .save_document("mblog_gtm_config", Topic::Gtm, &GtmConfig::default())
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "gtm:mblog_gtm_config".to_string(),
                "any:mblog_gtm_config".to_string()
            ]
        );
    }

    #[test]
    fn corrupt_previous_value_is_not_backed_up() {
        let store = MemoryStore::new();
        store.set_item("mblog_gtm_config", "][").unwrap();
        store
            .set_item("mblog_gtm_config_backup", r#"{"enabled":false}"#)
            .unwrap();
        let adapter = adapter(store);

        adapter
            .persist_document("mblog_gtm_config", &GtmConfig::default())
            .unwrap();

        assert_eq!(
            adapter.raw("mblog_gtm_config_backup").unwrap().as_deref(),
            Some(r#"{"enabled":false}"#)
        );
    }

    #[test]
    fn restore_without_backup_is_unavailable() {
        let adapter = adapter(MemoryStore::new());
        let err = adapter
            .restore_collection::<Category>(CATEGORIES_KEY, Topic::Categories)
            .unwrap_err();
        assert_eq!(
            err,
            RepositoryError::BackupUnavailable(CATEGORIES_KEY.to_string())
        );
    }
}
