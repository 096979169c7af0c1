use chrono::Utc;
use validator::Validate;

use crate::domain::content::{
    ContentKind, ContentPatch, ContentRecord, EngagementCounter, NewContent,
};
use crate::domain::types::ContentId;
use crate::error::{RepositoryError, RepositoryResult};
use crate::events::{ReorderDescriptor, StoreEvent, Topic};
use crate::repository::collection::{backfill_and_sort, move_item, next_id, next_order, renumber};
use crate::repository::{ContentReader, ContentWriter, StoreRepository};
use crate::storage::KeyValueStore;

impl<S: KeyValueStore> StoreRepository<S> {
    fn load_content(&self, kind: ContentKind) -> RepositoryResult<Vec<ContentRecord>> {
        let key = kind.storage_key();
        let mut records = self.adapter.read_collection(key, Vec::new)?;
        if kind.is_ordered() && backfill_and_sort(&mut records) {
            log::info!("back-filled missing order on {kind}");
            if let Err(e) = self.adapter.persist_collection(key, &records) {
                log::warn!("failed to persist order back-fill of {kind}: {e}");
            }
        }
        Ok(records)
    }

    fn save_content(&self, kind: ContentKind, records: &[ContentRecord]) -> RepositoryResult<()> {
        self.adapter
            .save_collection(kind.storage_key(), Topic::from(kind), records)
    }

    /// Apply `change` to the record with `id` and save. Returns the changed
    /// record, or `None` without writing when the id is unknown.
    fn modify_content(
        &self,
        kind: ContentKind,
        id: ContentId,
        change: impl FnOnce(&mut ContentRecord),
    ) -> RepositoryResult<Option<ContentRecord>> {
        let mut records = self.load_content(kind)?;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            log::debug!("{kind} record {id} not found");
            return Ok(None);
        };
        change(record);
        let changed = record.clone();
        self.save_content(kind, &records)?;
        Ok(Some(changed))
    }

    fn bump_counter(
        &self,
        kind: ContentKind,
        id: ContentId,
        counter: EngagementCounter,
    ) -> RepositoryResult<bool> {
        Ok(self
            .modify_content(kind, id, |record| record.bump(counter))?
            .is_some())
    }
}

impl<S: KeyValueStore> ContentReader for StoreRepository<S> {
    fn list_content(&self, kind: ContentKind) -> RepositoryResult<Vec<ContentRecord>> {
        self.load_content(kind)
    }

    fn get_content_by_id(
        &self,
        kind: ContentKind,
        id: ContentId,
    ) -> RepositoryResult<Option<ContentRecord>> {
        Ok(self
            .load_content(kind)?
            .into_iter()
            .find(|record| record.id == id))
    }

    fn get_content_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
    ) -> RepositoryResult<Option<ContentRecord>> {
        Ok(self
            .load_content(kind)?
            .into_iter()
            .find(|record| record.slug.as_deref() == Some(slug)))
    }

    fn is_liked(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool> {
        self.adapter.flag(&kind.like_flag_key(id))
    }
}

impl<S: KeyValueStore> ContentWriter for StoreRepository<S> {
    fn create_content(
        &self,
        kind: ContentKind,
        new: &NewContent,
    ) -> RepositoryResult<ContentRecord> {
        new.validate()?;
        let mut records = self.load_content(kind)?;

        let id = ContentId::new(next_id(&records)?)?;
        let order = kind
            .is_ordered()
            .then(|| next_order(&records))
            .transpose()?;
        let record = new
            .clone()
            .into_record(id, Utc::now().date_naive(), order, kind.is_slugged())?;

        records.push(record.clone());
        self.save_content(kind, &records)?;
        log::info!("created {kind} record {id}");
        Ok(record)
    }

    fn update_content(
        &self,
        kind: ContentKind,
        id: ContentId,
        patch: &ContentPatch,
    ) -> RepositoryResult<Option<ContentRecord>> {
        self.modify_content(kind, id, |record| patch.apply(record))
    }

    fn delete_content(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool> {
        let mut records = self.load_content(kind)?;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            log::debug!("{kind} record {id} not found");
            return Ok(false);
        }
        if kind.is_ordered() {
            renumber(&mut records);
        }
        self.save_content(kind, &records)?;
        log::info!("deleted {kind} record {id}");
        Ok(true)
    }

    fn reorder_content(
        &self,
        kind: ContentKind,
        from_index: usize,
        to_index: usize,
    ) -> RepositoryResult<()> {
        if !kind.is_ordered() {
            return Err(RepositoryError::Validation(format!(
                "{kind} are not manually ordered"
            )));
        }
        let mut records = self.load_content(kind)?;
        if !move_item(&mut records, from_index, to_index)? {
            return Ok(());
        }
        self.save_content(kind, &records)?;

        let descriptor = ReorderDescriptor {
            from_index,
            to_index,
            new_order: records.iter().map(|record| record.id.get()).collect(),
        };
        self.adapter.bus().publish(
            Topic::from(kind),
            &StoreEvent::Reordered {
                key: kind.storage_key().to_string(),
                descriptor,
            },
        );
        Ok(())
    }

    fn record_view(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool> {
        self.bump_counter(kind, id, EngagementCounter::Views)
    }

    fn record_download(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<bool> {
        self.bump_counter(kind, id, EngagementCounter::Downloads)
    }

    fn toggle_like(&self, kind: ContentKind, id: ContentId) -> RepositoryResult<Option<bool>> {
        let flag_key = kind.like_flag_key(id);
        let liked = self.adapter.flag(&flag_key)?;
        let changed = self.modify_content(kind, id, |record| {
            record.likes = if liked {
                record.likes.decrement()
            } else {
                record.likes.increment()
            };
        })?;
        if changed.is_none() {
            return Ok(None);
        }

        // The counter is already saved; a failed flag write leaves them out
        // of step until the next toggle.
        self.adapter.set_flag(&flag_key, !liked).inspect_err(|e| {
            log::error!("saved likes of {kind} record {id} but not its like flag: {e}");
        })?;
        Ok(Some(!liked))
    }

    fn reset_stats(&self, kind: ContentKind) -> RepositoryResult<usize> {
        let mut records = self.load_content(kind)?;
        records.iter_mut().for_each(ContentRecord::reset_counters);
        self.save_content(kind, &records)?;

        let mut cleared = 0;
        for key in self.adapter.keys()? {
            if kind.parse_like_flag_key(&key).is_some() && self.adapter.remove(&key)? {
                cleared += 1;
            }
        }
        log::info!(
            "reset stats of {} {kind} record(s), cleared {cleared} like flag(s)",
            records.len()
        );
        Ok(records.len())
    }

    fn replace_content(
        &self,
        kind: ContentKind,
        records: &[ContentRecord],
    ) -> RepositoryResult<()> {
        self.save_content(kind, records)?;
        log::info!("replaced {kind} with {} record(s)", records.len());
        Ok(())
    }
}
