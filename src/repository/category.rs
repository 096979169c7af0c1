use validator::Validate;

use crate::domain::category::{
    Category, CategoryPatch, DEFAULT_CATEGORY_COLOR, NewCategory, default_categories,
};
use crate::domain::types::{CategoryId, CategoryName};
use crate::error::RepositoryResult;
use crate::events::{ReorderDescriptor, StoreEvent, Topic};
use crate::repository::collection::{backfill_and_sort, move_item, next_id, next_order, renumber};
use crate::repository::{CategoryReader, CategoryWriter, StoreRepository};
use crate::storage::KeyValueStore;
use crate::storage::keys::CATEGORIES_KEY;

impl<S: KeyValueStore> StoreRepository<S> {
    fn load_categories(&self) -> RepositoryResult<Vec<Category>> {
        let mut categories = self
            .adapter
            .read_collection(CATEGORIES_KEY, default_categories)?;
        if backfill_and_sort(&mut categories) {
            log::info!("back-filled missing order on categories");
            if let Err(e) = self.adapter.persist_collection(CATEGORIES_KEY, &categories) {
                log::warn!("failed to persist order back-fill of categories: {e}");
            }
        }
        Ok(categories)
    }

    fn save_categories(&self, categories: &[Category]) -> RepositoryResult<()> {
        self.adapter
            .save_collection(CATEGORIES_KEY, Topic::Categories, categories)
    }
}

impl<S: KeyValueStore> CategoryReader for StoreRepository<S> {
    fn list_categories(&self) -> RepositoryResult<Vec<Category>> {
        self.load_categories()
    }

    fn get_category_by_id(&self, id: CategoryId) -> RepositoryResult<Option<Category>> {
        Ok(self
            .load_categories()?
            .into_iter()
            .find(|category| category.id == id))
    }

    fn get_category_by_name(&self, name: &str) -> RepositoryResult<Option<Category>> {
        Ok(self
            .load_categories()?
            .into_iter()
            .find(|category| category.name.as_str() == name))
    }
}

impl<S: KeyValueStore> CategoryWriter for StoreRepository<S> {
    fn create_category(&self, new: &NewCategory) -> RepositoryResult<Category> {
        new.validate()?;
        let mut categories = self.load_categories()?;

        let category = Category {
            id: CategoryId::new(next_id(&categories)?)?,
            name: CategoryName::new(new.name.as_str())?,
            color: new
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            order: Some(next_order(&categories)?),
            visible: new.visible,
            description: new.description.clone(),
        };
        categories.push(category.clone());
        self.save_categories(&categories)?;
        log::info!("created category {} '{}'", category.id, category.name);
        Ok(category)
    }

    fn update_category(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> RepositoryResult<Option<Category>> {
        let mut categories = self.load_categories()?;
        let Some(category) = categories.iter_mut().find(|category| category.id == id) else {
            return Ok(None);
        };
        patch.apply(category);
        let updated = category.clone();
        self.save_categories(&categories)?;
        Ok(Some(updated))
    }

    fn delete_category(&self, id: CategoryId) -> RepositoryResult<bool> {
        let mut categories = self.load_categories()?;
        let before = categories.len();
        categories.retain(|category| category.id != id);
        if categories.len() == before {
            return Ok(false);
        }
        renumber(&mut categories);
        self.save_categories(&categories)?;
        log::info!("deleted category {id}");
        Ok(true)
    }

    fn reorder_categories(&self, from_index: usize, to_index: usize) -> RepositoryResult<()> {
        let mut categories = self.load_categories()?;
        if !move_item(&mut categories, from_index, to_index)? {
            return Ok(());
        }
        self.save_categories(&categories)?;
        self.adapter.bus().publish(
            Topic::Categories,
            &StoreEvent::Reordered {
                key: CATEGORIES_KEY.to_string(),
                descriptor: ReorderDescriptor {
                    from_index,
                    to_index,
                    new_order: categories.iter().map(|category| category.id.get()).collect(),
                },
            },
        );
        Ok(())
    }
}
