//! Storage key layout.
//!
//! Each collection lives under one primary key; companion keys are derived
//! from it by suffix.

use crate::domain::content::ContentKind;
use crate::domain::types::TypeConstraintError;
use crate::events::Topic;

pub const CATEGORIES_KEY: &str = "mblog_categories";
pub const PROFILE_KEY: &str = "mblog_profile";
pub const ABOUT_KEY: &str = "mblog_about";
pub const GTM_KEY: &str = "mblog_gtm_config";
pub const CONSULTATION_KEY: &str = "mblog_consultation_button";
pub const PROBE_KEY: &str = "mblog_space_probe";

const BACKUP_SUFFIX: &str = "_backup";
const TIMESTAMP_SUFFIX: &str = "_timestamp";
const MANUAL_BACKUP_SUFFIX: &str = "_manual_backup";
const RESTORED_SUFFIX: &str = "_backup_restored";

pub fn backup_key(key: &str) -> String {
    format!("{key}{BACKUP_SUFFIX}")
}

pub fn timestamp_key(key: &str) -> String {
    format!("{key}{TIMESTAMP_SUFFIX}")
}

pub fn manual_backup_key(key: &str) -> String {
    format!("{key}{MANUAL_BACKUP_SUFFIX}")
}

pub fn restored_backup_key(key: &str) -> String {
    format!("{key}{RESTORED_SUFFIX}")
}

/// Classification of a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole<'a> {
    Primary(&'a str),
    AutoBackup(&'a str),
    ManualBackup(&'a str),
    RestoredBackup(&'a str),
    Timestamp(&'a str),
    LikeFlag(ContentKind),
    Probe,
    Other,
}

impl KeyRole<'_> {
    pub fn is_backup(&self) -> bool {
        matches!(
            self,
            KeyRole::AutoBackup(_) | KeyRole::ManualBackup(_) | KeyRole::RestoredBackup(_)
        )
    }
}

/// Stored values other than the content collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreDocument {
    Categories,
    Profile,
    About,
    Gtm,
    Consultation,
}

impl StoreDocument {
    pub const ALL: [StoreDocument; 5] = [
        StoreDocument::Categories,
        StoreDocument::Profile,
        StoreDocument::About,
        StoreDocument::Gtm,
        StoreDocument::Consultation,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Profile => "profile",
            Self::About => "about",
            Self::Gtm => "gtm",
            Self::Consultation => "consultation",
        }
    }

    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Categories => CATEGORIES_KEY,
            Self::Profile => PROFILE_KEY,
            Self::About => ABOUT_KEY,
            Self::Gtm => GTM_KEY,
            Self::Consultation => CONSULTATION_KEY,
        }
    }

    pub const fn topic(self) -> Topic {
        match self {
            Self::Categories => Topic::Categories,
            Self::Profile => Topic::Profile,
            Self::About => Topic::About,
            Self::Gtm => Topic::Gtm,
            Self::Consultation => Topic::Consultation,
        }
    }
}

impl std::fmt::Display for StoreDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<&str> for StoreDocument {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|document| document.name() == normalized)
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("document: {value}")))
    }
}

/// Every primary key managed by the store.
pub fn primary_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = ContentKind::ALL
        .iter()
        .map(|kind| kind.storage_key())
        .collect();
    keys.extend(StoreDocument::ALL.iter().map(|document| document.storage_key()));
    keys
}

/// Classify `key`. Longer suffixes are matched first since
/// `_manual_backup` also ends in `_backup`.
pub fn classify(key: &str) -> KeyRole<'_> {
    if key == PROBE_KEY {
        return KeyRole::Probe;
    }
    if let Some(base) = key.strip_suffix(RESTORED_SUFFIX) {
        return KeyRole::RestoredBackup(base);
    }
    if let Some(base) = key.strip_suffix(MANUAL_BACKUP_SUFFIX) {
        return KeyRole::ManualBackup(base);
    }
    if let Some(base) = key.strip_suffix(BACKUP_SUFFIX) {
        return KeyRole::AutoBackup(base);
    }
    if let Some(base) = key.strip_suffix(TIMESTAMP_SUFFIX) {
        return KeyRole::Timestamp(base);
    }
    if let Some(primary) = primary_keys().into_iter().find(|primary| *primary == key) {
        return KeyRole::Primary(primary);
    }
    ContentKind::ALL
        .into_iter()
        .find(|kind| kind.parse_like_flag_key(key).is_some())
        .map(KeyRole::LikeFlag)
        .unwrap_or(KeyRole::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_backup_family() {
        assert_eq!(
            classify("mblog_concepts_manual_backup"),
            KeyRole::ManualBackup("mblog_concepts")
        );
        assert_eq!(
            classify("mblog_concepts_backup_restored"),
            KeyRole::RestoredBackup("mblog_concepts")
        );
        assert_eq!(
            classify("mblog_concepts_backup"),
            KeyRole::AutoBackup("mblog_concepts")
        );
        assert_eq!(
            classify("mblog_concepts_timestamp"),
            KeyRole::Timestamp("mblog_concepts")
        );
    }

    #[test]
    fn classifies_like_flags() {
        assert_eq!(classify("liked_4"), KeyRole::LikeFlag(ContentKind::Concept));
        assert_eq!(
            classify("infographic_liked_4"),
            KeyRole::LikeFlag(ContentKind::Infographic)
        );
        assert_eq!(classify("liked_x"), KeyRole::Other);
    }

    #[test]
    fn parses_document_names() {
        assert_eq!(
            StoreDocument::try_from(" GTM "),
            Ok(StoreDocument::Gtm)
        );
        assert_eq!(StoreDocument::Profile.storage_key(), PROFILE_KEY);
        assert!(StoreDocument::try_from("concepts").is_err());
    }

    #[test]
    fn classifies_primary_and_probe() {
        assert_eq!(classify(CATEGORIES_KEY), KeyRole::Primary(CATEGORIES_KEY));
        assert_eq!(classify(PROBE_KEY), KeyRole::Probe);
        assert_eq!(classify("theme"), KeyRole::Other);
    }
}
