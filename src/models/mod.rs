pub mod config;
#[cfg(feature = "sqlite")]
pub mod kv_entry;
