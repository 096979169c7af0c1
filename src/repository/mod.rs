use crate::backup::BackupStatus;
use crate::domain::category::{Category, CategoryPatch, NewCategory};
use crate::domain::content::{ContentKind, ContentPatch, ContentRecord, NewContent};
use crate::domain::profile::{ProfileData, ProfilePatch, SocialLink, SocialLinkInput};
use crate::domain::site::{AboutPage, ConsultationButton, GtmConfig};
use crate::domain::types::{CategoryId, ContentId, SocialLinkId};
use crate::error::RepositoryResult;
use crate::events::EventBus;
use crate::models::config::StoreConfig;
use crate::storage::keys::StoreDocument;
use crate::storage::{KeyValueStore, PersistenceAdapter};

pub mod category;
pub mod collection;
pub mod content;
pub mod maintenance;
pub mod profile;
pub mod site;

/// Repository implementation backed by any [`KeyValueStore`].
///
/// Clones share the store and the event bus, allowing the repository to be
/// handed to every feature that needs it.
pub struct StoreRepository<S> {
    adapter: PersistenceAdapter<S>,
}

impl<S> Clone for StoreRepository<S> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
        }
    }
}

impl<S: KeyValueStore> StoreRepository<S> {
    /// Create a repository with its own event bus.
    pub fn new(store: S, config: &StoreConfig) -> Self {
        Self::with_bus(store, config, EventBus::new())
    }

    /// Create a repository publishing on an existing bus.
    pub fn with_bus(store: S, config: &StoreConfig, bus: EventBus) -> Self {
        Self {
            adapter: PersistenceAdapter::new(store, config, bus),
        }
    }

    pub fn adapter(&self) -> &PersistenceAdapter<S> {
        &self.adapter
    }

    pub fn bus(&self) -> &EventBus {
        self.adapter.bus()
    }
}

/// Read-only operations on content collections.
pub trait ContentReader {
    /// All records of `kind`. Ordered kinds come back sorted by `order`.
    fn list_content(&self, kind: ContentKind) -> RepositoryResult<Vec<ContentRecord>>;
    fn get_content_by_id(
        &self,
        kind: ContentKind,
        id: ContentId,
    ) -> RepositoryResult<Option<ContentRecord>>;
    /// First record whose slug matches. Slugs are not unique.
    fn get_content_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
    ) -> RepositoryResult<Option<ContentRecord>>;
    /// Whether the current visitor liked the record.
    fn is_liked(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool>;
}

pub trait ContentWriter {
    /// Insert a record, assigning id, creation date, zeroed counters and,
    /// depending on the kind, `order` and `slug`.
    fn create_content(&self, kind: ContentKind, new: &NewContent)
    -> RepositoryResult<ContentRecord>;
    /// Shallow-merge `patch` into the record. `None` when the id is unknown.
    fn update_content(
        &self,
        kind: ContentKind,
        id: ContentId,
        patch: &ContentPatch,
    ) -> RepositoryResult<Option<ContentRecord>>;
    /// Remove a record. Returns whether it existed. Like flags are kept.
    fn delete_content(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool>;
    /// Move the record at `from_index` to `to_index` in an ordered kind.
    fn reorder_content(
        &self,
        kind: ContentKind,
        from_index: usize,
        to_index: usize,
    ) -> RepositoryResult<()>;
    fn record_view(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool>;
    fn record_download(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool>;
    /// Flip the like flag and adjust `likes` accordingly. Returns the new
    /// flag, or `None` when the id is unknown.
    fn toggle_like(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<Option<bool>>;
    /// Zero every counter of `kind` and drop its like flags. Returns the
    /// number of records reset.
    fn reset_stats(&self, kind: ContentKind) -> RepositoryResult<usize>;
    /// Replace the whole collection.
    fn replace_content(&self, kind: ContentKind, records: &[ContentRecord])
    -> RepositoryResult<()>;
}

pub trait CategoryReader {
    /// All categories sorted by `order`.
    fn list_categories(&self) -> RepositoryResult<Vec<Category>>;
    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>>;
    fn get_category_by_name(&self, name: &str) -> RepositoryResult<Option<Category>>;
}

pub trait CategoryWriter {
    fn create_category(&self, new: &NewCategory) -> RepositoryResult<Category>;
    fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> RepositoryResult<Option<Category>>;
    /// Remove a category. Content referencing it by name is untouched.
    fn delete_category(&self, id: CategoryId) -> RepositoryResult<bool>;
    fn reorder_categories(&self, from_index: usize, to_index: usize) -> RepositoryResult<()>;
}

pub trait ProfileReader {
    /// The profile, created with defaults on first read.
    fn get_profile(&self) -> RepositoryResult<ProfileData>;
}

pub trait ProfileWriter {
    fn update_profile(&self, patch: &ProfilePatch) -> RepositoryResult<ProfileData>;
    fn add_social_link(&self, input: &SocialLinkInput) -> RepositoryResult<SocialLink>;
    fn update_social_link(
        &self,
        id: SocialLinkId,
        input: &SocialLinkInput,
    ) -> RepositoryResult<Option<SocialLink>>;
    fn remove_social_link(&self, id: SocialLinkId) -> RepositoryResult<bool>;
    /// Add a profile-scoped category. Returns `false` if already present.
    fn add_profile_category(&self, name: &str) -> RepositoryResult<bool>;
    fn remove_profile_category(&self, name: &str) -> RepositoryResult<bool>;
}

pub trait SiteSettingsReader {
    fn get_about(&self) -> RepositoryResult<AboutPage>;
    fn get_gtm_config(&self) -> RepositoryResult<GtmConfig>;
    fn get_consultation_button(&self) -> RepositoryResult<ConsultationButton>;
}

pub trait SiteSettingsWriter {
    fn save_about(&self, about: &AboutPage) -> RepositoryResult<()>;
    fn reset_about(&self) -> RepositoryResult<AboutPage>;
    fn save_gtm_config(&self, gtm: &GtmConfig) -> RepositoryResult<()>;
    fn reset_gtm_config(&self) -> RepositoryResult<GtmConfig>;
    fn save_consultation_button(&self, button: &ConsultationButton) -> RepositoryResult<()>;
    fn reset_consultation_button(&self) -> RepositoryResult<ConsultationButton>;
}

/// Storage-level operations used by the admin services.
pub trait StorageMaintenance {
    /// Raw text under `key`, without recovery or seeding.
    fn raw_value(&self, key: &str) -> RepositoryResult<Option<String>>;
    fn list_keys(&self) -> RepositoryResult<Vec<String>>;
    fn backup_status(&self, key: &str) -> RepositoryResult<BackupStatus>;
    /// Copy the primary value of `key` to its manual backup slot.
    fn create_manual_backup(&self, key: &str) -> RepositoryResult<usize>;
    /// Replace a content collection with its newest valid backup.
    fn restore_content(&self, kind: ContentKind) -> RepositoryResult<Vec<ContentRecord>>;
    /// Replace categories or a settings document with its newest valid
    /// backup. Returns the number of restored records.
    fn restore_document(&self, document: StoreDocument) -> RepositoryResult<usize>;
    /// Drop the manual and restored copies of `key`.
    fn cleanup_backups(&self, key: &str) -> RepositoryResult<usize>;
    fn storage_used(&self) -> RepositoryResult<usize>;
    fn storage_quota(&self) -> Option<usize>;
    /// Empirically measured free space.
    fn probe_available_space(&self) -> usize;
}
