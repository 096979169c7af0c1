//! Health, integrity, backup and reset operations for stored collections.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::content::{ContentKind, ContentRecord};
use crate::repository::collection::is_dense;
use crate::repository::{CategoryReader, ContentWriter, StorageMaintenance};
use crate::storage::adapter::decode_collection;
use crate::storage::keys::StoreDocument;

use super::{ServiceError, ServiceResult, log_and_map};

/// Share of the quota above which storage is reported as nearly full.
const STORAGE_WARNING_RATIO: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub collection: &'static str,
    pub healthy: bool,
    pub record_count: usize,
    pub last_saved: Option<DateTime<Utc>>,
    pub has_backup: bool,
    pub has_manual_backup: bool,
    pub storage_bytes: usize,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub collection: &'static str,
    pub valid: bool,
    pub issues: Vec<String>,
    /// Findings that do not make the collection invalid.
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageReport {
    pub used_bytes: usize,
    pub quota_bytes: Option<usize>,
    /// Largest payload the probe managed to store.
    pub available_bytes: usize,
}

/// Decode the stored collection without triggering recovery or seeding.
/// `Ok(None)` when nothing is stored yet.
fn stored_records<R>(
    repo: &R,
    kind: ContentKind,
) -> ServiceResult<Option<Result<Vec<ContentRecord>, String>>>
where
    R: StorageMaintenance,
{
    let raw = repo
        .raw_value(kind.storage_key())
        .map_err(|e| log_and_map("Failed to read collection", e))?;
    Ok(raw.map(|raw| decode_collection::<ContentRecord>(&raw).map_err(|e| e.to_string())))
}

pub fn health_check<R>(repo: &R, kind: ContentKind) -> ServiceResult<HealthReport>
where
    R: StorageMaintenance,
{
    let key = kind.storage_key();
    let mut issues = Vec::new();

    let record_count = match stored_records(repo, kind)? {
        None => {
            issues.push("collection has never been saved".to_string());
            0
        }
        Some(Ok(records)) => records.len(),
        Some(Err(e)) => {
            issues.push(format!("stored data is unreadable: {e}"));
            0
        }
    };

    let status = repo
        .backup_status(key)
        .map_err(|e| log_and_map("Failed to read backup status", e))?;
    if record_count > 0 && !status.has_auto && !status.has_manual {
        issues.push("no backup available".to_string());
    }

    let storage_bytes = repo
        .storage_used()
        .map_err(|e| log_and_map("Failed to measure storage", e))?;
    if let Some(quota) = repo.storage_quota()
        && quota > 0
        && storage_bytes as f64 > quota as f64 * STORAGE_WARNING_RATIO
    {
        issues.push(format!(
            "storage is {}% full",
            storage_bytes.saturating_mul(100) / quota
        ));
    }

    Ok(HealthReport {
        collection: kind.collection_name(),
        healthy: issues.is_empty(),
        record_count,
        last_saved: status.last_saved,
        has_backup: status.has_auto,
        has_manual_backup: status.has_manual,
        storage_bytes,
        issues,
    })
}

pub fn validate_integrity<R>(repo: &R, kind: ContentKind) -> ServiceResult<IntegrityReport>
where
    R: StorageMaintenance + CategoryReader,
{
    let mut report = IntegrityReport {
        collection: kind.collection_name(),
        valid: true,
        issues: Vec::new(),
        warnings: Vec::new(),
        suggestions: Vec::new(),
    };

    let records = match stored_records(repo, kind)? {
        None => Vec::new(),
        Some(Ok(records)) => records,
        Some(Err(e)) => {
            report.valid = false;
            report.issues.push(format!("stored data is unreadable: {e}"));
            report
                .suggestions
                .push("restore the collection from a backup".to_string());
            return Ok(report);
        }
    };

    let mut seen = BTreeSet::new();
    for record in &records {
        if !seen.insert(record.id) {
            report.issues.push(format!("duplicate id {}", record.id));
        }
    }
    if seen.len() != records.len() {
        report
            .suggestions
            .push("re-import the collection from a clean export".to_string());
    }

    if kind.is_ordered() && !is_dense(&records) {
        report
            .issues
            .push("order values are not a permutation of 1..N".to_string());
        report
            .suggestions
            .push("move any item to renumber the collection".to_string());
    }

    if kind.is_slugged() {
        let mut slugs: BTreeMap<&str, usize> = BTreeMap::new();
        for slug in records.iter().filter_map(|record| record.slug.as_deref()) {
            *slugs.entry(slug).or_default() += 1;
        }
        for (slug, count) in slugs.into_iter().filter(|(_, count)| *count > 1) {
            report
                .warnings
                .push(format!("slug '{slug}' is shared by {count} records"));
        }
    }

    let categories = repo
        .list_categories()
        .map_err(|e| log_and_map("Failed to list categories", e))?;
    let known: BTreeSet<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    for record in &records {
        if !record.category.is_empty() && !known.contains(record.category.as_str()) {
            report.warnings.push(format!(
                "record {} references unknown category '{}'",
                record.id, record.category
            ));
        }
    }

    let keys = repo
        .list_keys()
        .map_err(|e| log_and_map("Failed to list keys", e))?;
    let orphaned = keys
        .iter()
        .filter_map(|key| kind.parse_like_flag_key(key))
        .filter(|id| !seen.contains(id))
        .count();
    if orphaned > 0 {
        report
            .warnings
            .push(format!("{orphaned} like flag(s) point at deleted records"));
        report
            .suggestions
            .push("reset stats to clear stale like flags".to_string());
    }

    report.valid = report.issues.is_empty();
    Ok(report)
}

/// Store a manual backup of the collection. Returns its size in bytes.
pub fn create_backup<R>(repo: &R, kind: ContentKind) -> ServiceResult<usize>
where
    R: StorageMaintenance,
{
    repo.create_manual_backup(kind.storage_key())
        .map_err(|e| log_and_map("Failed to create backup", e))
}

/// Replace the collection with its newest valid backup. Returns the number of
/// restored records.
pub fn restore_backup<R>(repo: &R, kind: ContentKind) -> ServiceResult<usize>
where
    R: StorageMaintenance,
{
    repo.restore_content(kind)
        .map(|records| records.len())
        .map_err(|e| log_and_map("Failed to restore backup", e))
}

/// Restore categories or a settings document from its newest valid backup.
pub fn restore_document_backup<R>(repo: &R, document: StoreDocument) -> ServiceResult<usize>
where
    R: StorageMaintenance,
{
    repo.restore_document(document)
        .map_err(|e| log_and_map("Failed to restore backup", e))
}

pub fn cleanup_backups<R>(repo: &R, kind: ContentKind) -> ServiceResult<usize>
where
    R: StorageMaintenance,
{
    repo.cleanup_backups(kind.storage_key())
        .map_err(|e| log_and_map("Failed to clean up backups", e))
}

pub fn probe_storage<R>(repo: &R) -> ServiceResult<StorageReport>
where
    R: StorageMaintenance,
{
    let used_bytes = repo
        .storage_used()
        .map_err(|e| log_and_map("Failed to measure storage", e))?;
    Ok(StorageReport {
        used_bytes,
        quota_bytes: repo.storage_quota(),
        available_bytes: repo.probe_available_space(),
    })
}

/// Zero every counter of the collection. Refused unless `confirmed`.
pub fn reset_stats<R>(repo: &R, kind: ContentKind, confirmed: bool) -> ServiceResult<usize>
where
    R: ContentWriter,
{
    if !confirmed {
        log::warn!("refusing to reset {kind} stats without confirmation");
        return Err(ServiceError::Confirmation);
    }
    repo.reset_stats(kind)
        .map_err(|e| log_and_map("Failed to reset stats", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::NewContent;
    use crate::domain::types::ContentId;
    use crate::repository::test::{failing_repository, memory_repository, seed_content};
    use crate::repository::{ContentReader, ContentWriter};
    use crate::repository::StoreRepository;
    use crate::repository::test::test_config;
    use crate::repository::{ProfileReader, ProfileWriter};
    use crate::storage::{KeyValueStore, MemoryStore};

    #[test]
    fn fresh_collection_reports_never_saved() {
        let repo = memory_repository();
        let report = health_check(&repo, ContentKind::Concept).unwrap();
        assert!(!report.healthy);
        assert_eq!(report.record_count, 0);
        assert_eq!(report.issues, vec!["collection has never been saved".to_string()]);
    }

    #[test]
    fn healthy_after_a_few_saves() {
        let repo = memory_repository();
        seed_content(&repo, ContentKind::Concept, &["A", "B"]);
        let report = health_check(&repo, ContentKind::Concept).unwrap();
        assert!(report.healthy, "{:?}", report.issues);
        assert_eq!(report.record_count, 2);
        assert!(report.has_backup);
        assert!(report.last_saved.is_some());
    }

    #[test]
    fn corrupt_collection_is_unhealthy_and_invalid() {
        let repo = memory_repository();
        repo.adapter()
            .store()
            .set_item(ContentKind::Article.storage_key(), "[{]")
            .unwrap();

        assert!(!health_check(&repo, ContentKind::Article).unwrap().healthy);
        let integrity = validate_integrity(&repo, ContentKind::Article).unwrap();
        assert!(!integrity.valid);
        assert_eq!(integrity.suggestions.len(), 1);
    }

    #[test]
    fn integrity_flags_duplicates_and_dangling_references() {
        let repo = memory_repository();
        seed_content(&repo, ContentKind::Article, &["Same"]);
        repo.create_content(ContentKind::Article, &NewContent::new("Same", "Cooking"))
            .unwrap();
        let mut records = repo.list_content(ContentKind::Article).unwrap();
        records.push(records[0].clone());
        repo.replace_content(ContentKind::Article, &records).unwrap();
        repo.adapter()
            .set_flag(&ContentKind::Article.like_flag_key(ContentId::new(42).unwrap()), true)
            .unwrap();

        let report = validate_integrity(&repo, ContentKind::Article).unwrap();

        assert!(!report.valid);
        assert_eq!(report.issues, vec!["duplicate id 1".to_string()]);
        assert!(report.warnings.iter().any(|w| w.contains("slug 'same'")));
        assert!(report.warnings.iter().any(|w| w.contains("'Cooking'")));
        assert!(report.warnings.iter().any(|w| w.contains("like flag")));
    }

    #[test]
    fn integrity_flags_broken_order() {
        let repo = memory_repository();
        seed_content(&repo, ContentKind::Favorite, &["A", "B"]);
        let mut records = repo.list_content(ContentKind::Favorite).unwrap();
        records[1].order = Some(7);
        repo.replace_content(ContentKind::Favorite, &records).unwrap();

        let report = validate_integrity(&repo, ContentKind::Favorite).unwrap();
        assert!(!report.valid);

        repo.reorder_content(ContentKind::Favorite, 0, 1).unwrap();
        assert!(validate_integrity(&repo, ContentKind::Favorite).unwrap().valid);
    }

    #[test]
    fn reset_requires_confirmation() {
        let repo = memory_repository();
        seed_content(&repo, ContentKind::Concept, &["A"]);
        repo.record_view(ContentKind::Concept, ContentId::new(1).unwrap())
            .unwrap();

        assert_eq!(
            reset_stats(&repo, ContentKind::Concept, false),
            Err(ServiceError::Confirmation)
        );
        assert_eq!(repo.list_content(ContentKind::Concept).unwrap()[0].views, 1);

        assert_eq!(reset_stats(&repo, ContentKind::Concept, true), Ok(1));
        assert_eq!(repo.list_content(ContentKind::Concept).unwrap()[0].views, 0);
    }

    #[test]
    fn restore_without_backup_is_not_found() {
        let repo = memory_repository();
        assert_eq!(
            restore_backup(&repo, ContentKind::Resource),
            Err(ServiceError::NotFound)
        );
    }

    #[test]
    fn backend_failures_are_internal() {
        let repo = failing_repository();
        assert_eq!(
            health_check(&repo, ContentKind::Concept),
            Err(ServiceError::Internal)
        );
        assert_eq!(
            create_backup(&repo, ContentKind::Concept),
            Err(ServiceError::Internal)
        );
    }

    #[test]
    fn probe_reports_usage() {
        let repo = memory_repository();
        seed_content(&repo, ContentKind::Concept, &["A"]);
        let report = probe_storage(&repo).unwrap();
        assert!(report.used_bytes > 0);
        assert_eq!(report.quota_bytes, None);
        assert_eq!(report.available_bytes, 64 * 1024);
    }

    #[test]
    fn nearly_full_storage_is_reported() {
        let store = MemoryStore::with_quota(1000);
        store.set_item(ContentKind::Concept.storage_key(), "[]").unwrap();
        store.set_item("filler", &"x".repeat(900)).unwrap();
        let repo = StoreRepository::new(store, &test_config());

        let report = health_check(&repo, ContentKind::Concept).unwrap();
        assert!(!report.healthy);
        assert_eq!(report.storage_bytes, 922);
        assert_eq!(report.issues, vec!["storage is 92% full".to_string()]);
    }

    #[test]
    fn documents_restore_through_the_service() {
        let repo = memory_repository();
        let original = repo.get_profile().unwrap();
        repo.add_profile_category("Travel").unwrap();

        assert_eq!(restore_document_backup(&repo, StoreDocument::Profile), Ok(1));
        assert_eq!(repo.get_profile().unwrap(), original);
        assert_eq!(
            restore_document_backup(&repo, StoreDocument::Gtm),
            Err(ServiceError::NotFound)
        );
    }
}
