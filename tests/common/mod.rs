//! Helpers for integration tests.
#![allow(dead_code)]

use mblog_store::db::{DbPool, establish_connection_pool};
use mblog_store::models::config::StoreConfig;
use mblog_store::repository::StoreRepository;
use mblog_store::storage::{MemoryStore, SqliteStore};
use tempfile::NamedTempFile;

/// Temporary database used in integration tests.
pub struct TestDb {
    _tempfile: NamedTempFile,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let tempfile = NamedTempFile::new().expect("Failed to create temp file");
        let pool = establish_connection_pool(tempfile.path().to_str().unwrap())
            .expect("Failed to establish SQLite connection.");
        TestDb {
            _tempfile: tempfile,
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// Store on this database, migrated, with an optional quota.
    pub fn store(&self, quota: Option<usize>) -> SqliteStore {
        SqliteStore::from_pool(self.pool(), quota).expect("Migrations failed")
    }
}

/// Config with a small free-space probe.
pub fn config() -> StoreConfig {
    StoreConfig {
        quota_bytes: None,
        probe_limit_bytes: 64 * 1024,
        probe_chunk_bytes: 1024,
        ..StoreConfig::default()
    }
}

pub fn sqlite_repository(db: &TestDb) -> StoreRepository<SqliteStore> {
    StoreRepository::new(db.store(None), &config())
}

pub fn memory_repository(store: MemoryStore) -> StoreRepository<MemoryStore> {
    StoreRepository::new(store, &config())
}
