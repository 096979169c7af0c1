use crate::backup::BackupStatus;
use crate::domain::category::Category;
use crate::domain::content::{ContentKind, ContentRecord};
use crate::domain::profile::ProfileData;
use crate::domain::site::{AboutPage, ConsultationButton, GtmConfig};
use crate::error::RepositoryResult;
use crate::events::Topic;
use crate::repository::{StorageMaintenance, StoreRepository};
use crate::storage::KeyValueStore;
use crate::storage::keys::StoreDocument;

impl<S: KeyValueStore> StorageMaintenance for StoreRepository<S> {
    fn raw_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.adapter.raw(key)
    }

    fn list_keys(&self) -> RepositoryResult<Vec<String>> {
        self.adapter.keys()
    }

    fn backup_status(&self, key: &str) -> RepositoryResult<BackupStatus> {
        self.adapter.backups().status(key)
    }

    fn create_manual_backup(&self, key: &str) -> RepositoryResult<usize> {
        self.adapter.backups().manual_backup(key)
    }

    fn restore_content(&self, kind: ContentKind) -> RepositoryResult<Vec<ContentRecord>> {
        self.adapter
            .restore_collection(kind.storage_key(), Topic::from(kind))
    }

    fn restore_document(&self, document: StoreDocument) -> RepositoryResult<usize> {
        let key = document.storage_key();
        let topic = document.topic();
        match document {
            StoreDocument::Categories => self
                .adapter
                .restore_collection::<Category>(key, topic)
                .map(|categories| categories.len()),
            StoreDocument::Profile => self
                .adapter
                .restore_document::<ProfileData>(key, topic)
                .map(|_| 1),
            StoreDocument::About => self
                .adapter
                .restore_document::<AboutPage>(key, topic)
                .map(|_| 1),
            StoreDocument::Gtm => self
                .adapter
                .restore_document::<GtmConfig>(key, topic)
                .map(|_| 1),
            StoreDocument::Consultation => self
                .adapter
                .restore_document::<ConsultationButton>(key, topic)
                .map(|_| 1),
        }
    }

    fn cleanup_backups(&self, key: &str) -> RepositoryResult<usize> {
        self.adapter.backups().cleanup(key)
    }

    fn storage_used(&self) -> RepositoryResult<usize> {
        Ok(self.adapter.store().used_bytes()?)
    }

    fn storage_quota(&self) -> Option<usize> {
        self.adapter.store().quota_bytes()
    }

    fn probe_available_space(&self) -> usize {
        self.adapter.backups().probe_available_space()
    }
}
