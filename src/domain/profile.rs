//! Singleton profile shown on the landing page.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::types::{LinkUrl, SocialLinkId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub id: SocialLinkId,
    pub platform: String,
    pub url: LinkUrl,
    #[serde(default)]
    pub icon: String,
}

/// Input for adding or replacing a social link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinkInput {
    #[validate(length(min = 1, max = 50))]
    pub platform: String,
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Image URL, path or embedded data URL.
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
    /// Profile-scoped categories, distinct from the site-wide list.
    #[serde(default)]
    #[validate(length(max = 20))]
    pub categories: Vec<String>,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            name: "MBlog".to_string(),
            title: "Developer & Writer".to_string(),
            description: "Notes, concepts and infographics.".to_string(),
            profile_image: String::new(),
            social_links: Vec::new(),
            categories: vec!["Tech".to_string(), "Design".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut ProfileData) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(title) = &self.title {
            profile.title = title.clone();
        }
        if let Some(description) = &self.description {
            profile.description = description.clone();
        }
        if let Some(profile_image) = &self.profile_image {
            profile.profile_image = profile_image.clone();
        }
    }
}
