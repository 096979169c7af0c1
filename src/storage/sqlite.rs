//! Durable [`KeyValueStore`] on a single SQLite table.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::db::{DbConnection, DbPool, establish_connection_pool};
use crate::error::{StorageError, StorageResult};
use crate::models::kv_entry::{KvEntry, KvEntryRef};
use crate::schema::kv_store;
use crate::storage::{KeyValueStore, entry_size};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

const USED_BYTES_SQL: &str =
    "COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)";

/// Key-value store persisted in the `kv_store` table.
///
/// The pool is cheap to clone. The quota, when set, is enforced inside the
/// write transaction.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    quota: Option<usize>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("quota", &self.quota)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open the database at `database_url` and apply pending migrations.
    pub fn open(database_url: &str, quota: Option<usize>) -> StorageResult<Self> {
        let pool = establish_connection_pool(database_url)?;
        Self::from_pool(pool, quota)
    }

    /// Wrap an existing pool, applying pending migrations.
    pub fn from_pool(pool: DbPool, quota: Option<usize>) -> StorageResult<Self> {
        let mut conn = pool.get()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| StorageError::Backend(format!("migrations failed: {e}")))?;
        if !applied.is_empty() {
            log::info!("applied {} migration(s)", applied.len());
        }
        Ok(Self { pool, quota })
    }

    fn conn(&self) -> StorageResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Every stored row, ordered by key.
    pub fn entries(&self) -> StorageResult<Vec<KvEntry>> {
        let mut conn = self.conn()?;
        let rows = kv_store::table
            .select(KvEntry::as_select())
            .order(kv_store::key.asc())
            .load(&mut conn)?;
        Ok(rows)
    }
}

fn total_bytes(conn: &mut SqliteConnection) -> QueryResult<usize> {
    let used = kv_store::table
        .select(sql::<BigInt>(USED_BYTES_SQL))
        .first::<i64>(conn)
        .optional()?
        .unwrap_or(0);
    Ok(used.max(0) as usize)
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let mut conn = self.conn()?;
        let value = kv_store::table
            .find(key)
            .select(kv_store::value)
            .first::<String>(&mut conn)
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let quota = self.quota;
        conn.immediate_transaction::<_, StorageError, _>(|conn| {
            if let Some(quota) = quota {
                let used = total_bytes(conn)?;
                let replaced = kv_store::table
                    .find(key)
                    .select(kv_store::value)
                    .first::<String>(conn)
                    .optional()?
                    .map_or(0, |old| entry_size(key, &old));
                let available = quota.saturating_sub(used.saturating_sub(replaced));
                let requested = entry_size(key, value);
                if requested > available {
                    return Err(StorageError::QuotaExceeded {
                        requested,
                        available,
                    });
                }
            }

            diesel::replace_into(kv_store::table)
                .values(KvEntryRef { key, value })
                .execute(conn)?;
            Ok(())
        })
    }

    fn remove_item(&self, key: &str) -> StorageResult<bool> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(kv_store::table.find(key)).execute(&mut conn)?;
        Ok(affected > 0)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut conn = self.conn()?;
        let keys = kv_store::table
            .select(kv_store::key)
            .order(kv_store::key.asc())
            .load::<String>(&mut conn)?;
        Ok(keys)
    }

    fn used_bytes(&self) -> StorageResult<usize> {
        let mut conn = self.conn()?;
        Ok(total_bytes(&mut conn)?)
    }

    fn quota_bytes(&self) -> Option<usize> {
        self.quota
    }
}
