use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::types::{CategoryId, CategoryName};

pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let digits = color.strip_prefix('#').unwrap_or("");
    if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color"))
    }
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

fn default_visible() -> bool {
    true
}

/// Site-wide category. Content records reference it by `name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    #[serde(default = "default_color")]
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub description: String,
}

/// Data required to insert a new [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            description: String::new(),
            visible: true,
        }
    }
}

/// Partial update for a [`Category`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryPatch {
    pub name: Option<CategoryName>,
    pub color: Option<String>,
    pub visible: Option<bool>,
    pub description: Option<String>,
}

impl CategoryPatch {
    pub fn apply(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(color) = &self.color {
            category.color = color.clone();
        }
        if let Some(visible) = self.visible {
            category.visible = visible;
        }
        if let Some(description) = &self.description {
            category.description = description.clone();
        }
    }
}

/// Categories seeded on first read.
pub fn default_categories() -> Vec<Category> {
    [
        ("Tech", "#3b82f6", "Software and engineering"),
        ("Design", "#ec4899", "Visual and product design"),
        ("Business", "#10b981", "Strategy and growth"),
        ("Life", "#f59e0b", "Notes on everything else"),
    ]
    .into_iter()
    .enumerate()
    .filter_map(|(idx, (name, color, description))| {
        Some(Category {
            id: CategoryId::new(idx as i64 + 1).ok()?,
            name: CategoryName::new(name).ok()?,
            color: color.to_string(),
            order: Some(idx as u32 + 1),
            visible: true,
            description: description.to_string(),
        })
    })
    .collect()
}
