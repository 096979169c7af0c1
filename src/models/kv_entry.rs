use diesel::prelude::*;

/// Row of the `kv_store` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::kv_store)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// Borrowed row used for upserts.
#[derive(Insertable)]
#[diesel(table_name = crate::schema::kv_store)]
pub struct KvEntryRef<'a> {
    pub key: &'a str,
    pub value: &'a str,
}
