use validator::Validate;

use crate::domain::profile::{ProfileData, ProfilePatch, SocialLink, SocialLinkInput};
use crate::domain::types::{LinkUrl, SocialLinkId};
use crate::error::{RepositoryError, RepositoryResult};
use crate::events::Topic;
use crate::repository::collection::next_id;
use crate::repository::{ProfileReader, ProfileWriter, StoreRepository};
use crate::storage::KeyValueStore;
use crate::storage::keys::PROFILE_KEY;

impl<S: KeyValueStore> StoreRepository<S> {
    fn save_profile(&self, profile: &ProfileData) -> RepositoryResult<()> {
        self.adapter
            .save_document(PROFILE_KEY, Topic::Profile, profile)
    }

    fn social_link_from(id: SocialLinkId, input: &SocialLinkInput) -> RepositoryResult<SocialLink> {
        input.validate()?;
        Ok(SocialLink {
            id,
            platform: input.platform.trim().to_string(),
            url: LinkUrl::new(input.url.as_str())?,
            icon: input.icon.clone(),
        })
    }
}

impl<S: KeyValueStore> ProfileReader for StoreRepository<S> {
    fn get_profile(&self) -> RepositoryResult<ProfileData> {
        self.adapter.read_document(PROFILE_KEY, ProfileData::default)
    }
}

impl<S: KeyValueStore> ProfileWriter for StoreRepository<S> {
    fn update_profile(&self, patch: &ProfilePatch) -> RepositoryResult<ProfileData> {
        let mut profile = self.get_profile()?;
        patch.apply(&mut profile);
        self.save_profile(&profile)?;
        Ok(profile)
    }

    fn add_social_link(&self, input: &SocialLinkInput) -> RepositoryResult<SocialLink> {
        let mut profile = self.get_profile()?;
        let id = SocialLinkId::new(next_id(&profile.social_links)?)?;
        let link = Self::social_link_from(id, input)?;
        profile.social_links.push(link.clone());
        self.save_profile(&profile)?;
        Ok(link)
    }

    fn update_social_link(
        &self,
        id: SocialLinkId,
        input: &SocialLinkInput,
    ) -> RepositoryResult<Option<SocialLink>> {
        let mut profile = self.get_profile()?;
        let Some(slot) = profile.social_links.iter_mut().find(|link| link.id == id) else {
            return Ok(None);
        };
        *slot = Self::social_link_from(id, input)?;
        let link = slot.clone();
        self.save_profile(&profile)?;
        Ok(Some(link))
    }

    fn remove_social_link(&self, id: SocialLinkId) -> RepositoryResult<bool> {
        let mut profile = self.get_profile()?;
        let before = profile.social_links.len();
        profile.social_links.retain(|link| link.id != id);
        if profile.social_links.len() == before {
            return Ok(false);
        }
        self.save_profile(&profile)?;
        Ok(true)
    }

    fn add_profile_category(&self, name: &str) -> RepositoryResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }
        let mut profile = self.get_profile()?;
        if profile.categories.iter().any(|existing| existing == name) {
            return Ok(false);
        }
        profile.categories.push(name.to_string());
        self.save_profile(&profile)?;
        Ok(true)
    }

    fn remove_profile_category(&self, name: &str) -> RepositoryResult<bool> {
        let mut profile = self.get_profile()?;
        let before = profile.categories.len();
        profile.categories.retain(|existing| existing != name.trim());
        if profile.categories.len() == before {
            return Ok(false);
        }
        self.save_profile(&profile)?;
        Ok(true)
    }
}
