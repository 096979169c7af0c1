//! Content records shared by every content kind (concepts, infographics,
//! articles, tutorials, resources, favorites).

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::slug::slugify;
use crate::domain::types::{ContentId, Counter, Title, TypeConstraintError};

/// The content collections managed by the store.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Concept,
    Infographic,
    Article,
    Tutorial,
    Resource,
    Favorite,
}

impl ContentKind {
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Concept,
        ContentKind::Infographic,
        ContentKind::Article,
        ContentKind::Tutorial,
        ContentKind::Resource,
        ContentKind::Favorite,
    ];

    /// Collection name used in export documents and on the command line.
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::Concept => "concepts",
            Self::Infographic => "infographics",
            Self::Article => "articles",
            Self::Tutorial => "tutorials",
            Self::Resource => "resources",
            Self::Favorite => "favorites",
        }
    }

    /// Primary storage key of the collection.
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Concept => "mblog_concepts",
            Self::Infographic => "mblog_infographics",
            Self::Article => "mblog_articles",
            Self::Tutorial => "mblog_tutorials",
            Self::Resource => "mblog_resources",
            Self::Favorite => "mblog_favorites",
        }
    }

    /// Whether records carry a dense manual `order`.
    pub const fn is_ordered(self) -> bool {
        matches!(self, Self::Infographic | Self::Favorite)
    }

    /// Whether records get a slug derived from the title on creation.
    pub const fn is_slugged(self) -> bool {
        matches!(self, Self::Infographic | Self::Article | Self::Tutorial)
    }

    /// Prefix of the per-record like flag keys.
    ///
    /// Concepts predate the per-kind prefixes and keep the bare `liked_`.
    pub const fn like_flag_prefix(self) -> &'static str {
        match self {
            Self::Concept => "liked_",
            Self::Infographic => "infographic_liked_",
            Self::Article => "article_liked_",
            Self::Tutorial => "tutorial_liked_",
            Self::Resource => "resource_liked_",
            Self::Favorite => "favorite_liked_",
        }
    }

    pub fn like_flag_key(self, id: ContentId) -> String {
        format!("{}{}", self.like_flag_prefix(), id)
    }

    /// Parse the record id out of a like flag key belonging to this kind.
    pub fn parse_like_flag_key(self, key: &str) -> Option<ContentId> {
        key.strip_prefix(self.like_flag_prefix())
            .and_then(|rest| rest.parse::<i64>().ok())
            .and_then(|raw| ContentId::new(raw).ok())
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection_name())
    }
}

impl TryFrom<&str> for ContentKind {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.collection_name() == normalized
                    || kind.collection_name().trim_end_matches('s') == normalized
            })
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("content kind: {value}")))
    }
}

/// Publication state of a record.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Published,
    Draft,
    Hidden,
}

/// Accepts both `YYYY-MM-DD` and full ISO-8601 timestamps, keeping the date.
fn deserialize_created_at<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date_part = raw.get(..10).unwrap_or(raw.as_str());
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slugify(slug) == slug {
        Ok(())
    } else {
        Err(ValidationError::new("slug_format"))
    }
}

/// A stored content record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: ContentId,
    pub title: Title,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    /// Category name. Soft reference: renames and deletes do not cascade.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    #[serde(default)]
    pub views: Counter,
    #[serde(default)]
    pub likes: Counter,
    #[serde(default)]
    pub comments: Counter,
    #[serde(default)]
    pub downloads: Counter,
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: NaiveDate,
    #[serde(default)]
    pub has_video: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Data required to create a new [`ContentRecord`].
///
/// Identity, creation date, counters, order and slug are assigned by the
/// repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewContent {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: String,
    pub content: String,
    #[validate(length(max = 100))]
    pub category: String,
    pub has_video: bool,
    pub is_popular: bool,
    pub status: ContentStatus,
    #[validate(length(min = 1))]
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

impl NewContent {
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Stamp repository-assigned fields onto the new record.
    pub fn into_record(
        self,
        id: ContentId,
        created_at: NaiveDate,
        order: Option<u32>,
        slugged: bool,
    ) -> Result<ContentRecord, TypeConstraintError> {
        let title = Title::new(self.title)?;
        let slug = slugged.then(|| slugify(title.as_str()));
        Ok(ContentRecord {
            id,
            title,
            description: self.description,
            content: self.content,
            category: self.category,
            views: Counter::ZERO,
            likes: Counter::ZERO,
            comments: Counter::ZERO,
            downloads: Counter::ZERO,
            created_at,
            has_video: self.has_video,
            is_popular: self.is_popular,
            status: self.status,
            order,
            slug,
            image_url: self.image_url,
            tags: self.tags,
        })
    }
}

/// Partial update merged field-by-field into an existing record.
///
/// `id`, `createdAt` and `order` are not patchable; the slug is only changed
/// when given explicitly, never regenerated from a new title.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentPatch {
    pub title: Option<Title>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub views: Option<Counter>,
    pub likes: Option<Counter>,
    pub comments: Option<Counter>,
    pub downloads: Option<Counter>,
    pub has_video: Option<bool>,
    pub is_popular: Option<bool>,
    pub status: Option<ContentStatus>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, record: &mut ContentRecord) {
        if let Some(title) = &self.title {
            record.title = title.clone();
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(content) = &self.content {
            record.content = content.clone();
        }
        if let Some(category) = &self.category {
            record.category = category.clone();
        }
        if let Some(views) = self.views {
            record.views = views;
        }
        if let Some(likes) = self.likes {
            record.likes = likes;
        }
        if let Some(comments) = self.comments {
            record.comments = comments;
        }
        if let Some(downloads) = self.downloads {
            record.downloads = downloads;
        }
        if let Some(has_video) = self.has_video {
            record.has_video = has_video;
        }
        if let Some(is_popular) = self.is_popular {
            record.is_popular = is_popular;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(slug) = &self.slug {
            record.slug = Some(slug.clone());
        }
        if let Some(image_url) = &self.image_url {
            record.image_url = Some(image_url.clone());
        }
        if let Some(tags) = &self.tags {
            record.tags = tags.clone();
        }
    }
}

/// Engagement counter targeted by an increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngagementCounter {
    Views,
    Downloads,
}

impl ContentRecord {
    pub fn bump(&mut self, counter: EngagementCounter) {
        match counter {
            EngagementCounter::Views => self.views = self.views.increment(),
            EngagementCounter::Downloads => self.downloads = self.downloads.increment(),
        }
    }

    pub fn reset_counters(&mut self) {
        self.views = Counter::ZERO;
        self.likes = Counter::ZERO;
        self.comments = Counter::ZERO;
        self.downloads = Counter::ZERO;
    }
}
