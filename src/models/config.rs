use serde::Deserialize;

/// Configuration options for the MBlog store.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path backing the key-value store.
    pub database_url: String,
    /// Capacity enforced by the store. `None` means unbounded.
    pub quota_bytes: Option<usize>,
    /// Fraction of the remaining space a backup may take before stale keys
    /// are cleaned up first.
    pub backup_threshold: f64,
    /// Upper bound for the empirical free-space probe.
    pub probe_limit_bytes: usize,
    /// Initial payload size of the free-space probe; doubled on each step.
    pub probe_chunk_bytes: usize,
    /// Version string written into export documents.
    pub export_version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "mblog.db".to_string(),
            quota_bytes: Some(5 * 1024 * 1024),
            backup_threshold: 0.85,
            probe_limit_bytes: 5 * 1024 * 1024,
            probe_chunk_bytes: 64 * 1024,
            export_version: "1.0".to_string(),
        }
    }
}
