//! Singleton site settings: about page, tag manager and consultation button.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AboutSection {
    #[validate(length(min = 1, max = 120))]
    pub heading: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[validate(length(min = 1, max = 60))]
    pub name: String,
    /// Proficiency in percent.
    #[validate(range(max = 100))]
    pub level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AboutPage {
    #[validate(length(min = 1, max = 200))]
    pub headline: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    #[validate(nested)]
    pub sections: Vec<AboutSection>,
    #[serde(default)]
    #[validate(nested)]
    pub skills: Vec<Skill>,
}

impl Default for AboutPage {
    fn default() -> Self {
        Self {
            headline: "About me".to_string(),
            intro: String::new(),
            sections: Vec::new(),
            skills: Vec::new(),
        }
    }
}

fn validate_container_id(container_id: &str) -> Result<(), ValidationError> {
    let suffix = container_id.strip_prefix("GTM-").unwrap_or("");
    if !suffix.is_empty()
        && suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        Ok(())
    } else {
        Err(ValidationError::new("gtm_container_id"))
    }
}

fn validate_gtm(config: &GtmConfig) -> Result<(), ValidationError> {
    if config.enabled && config.container_id.is_none() {
        return Err(ValidationError::new("gtm_enabled_without_container"));
    }
    Ok(())
}

/// Tag manager settings. Only stored here; script injection happens in the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_gtm"))]
pub struct GtmConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_container_id"))]
    pub container_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationButton {
    #[serde(default)]
    pub enabled: bool,
    #[validate(length(min = 1, max = 40))]
    pub label: String,
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

impl Default for ConsultationButton {
    fn default() -> Self {
        Self {
            enabled: false,
            label: "Book a consultation".to_string(),
            url: "https://example.com/contact".to_string(),
            open_in_new_tab: true,
        }
    }
}
