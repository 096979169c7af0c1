//! JSON export and import of content collections.
//!
//! Export documents look like
//! `{"<collection>": [...], "exportedAt": "<RFC 3339>", "version": "1.0"}`.
//! Older exports carrying `exportDate` instead of `exportedAt` are accepted.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::content::{ContentKind, ContentRecord};
use crate::repository::{ContentReader, ContentWriter};
use crate::storage::validate::{describe, validate_collection};

use super::{ServiceError, ServiceResult, log_and_map};

#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub collection: &'static str,
    pub imported: usize,
    pub version: String,
    pub exported_at: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("file is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("export document must be a JSON object")]
    NotAnObject,
    #[error("missing '{0}' array")]
    MissingCollection(&'static str),
    #[error("missing export timestamp")]
    MissingTimestamp,
    #[error("invalid export timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("missing version")]
    MissingVersion,
    #[error("invalid records: {}", .0.join("; "))]
    InvalidRecords(Vec<String>),
    #[error("duplicate record id {0}")]
    DuplicateId(i64),
}

impl From<ImportError> for ServiceError {
    fn from(val: ImportError) -> Self {
        ServiceError::Form(val.to_string())
    }
}

/// Accepts full RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
fn check_timestamp(raw: &str) -> Result<(), ImportError> {
    let is_date = raw
        .get(..10)
        .is_some_and(|date| chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
    if DateTime::parse_from_rfc3339(raw).is_ok() || (raw.len() == 10 && is_date) {
        Ok(())
    } else {
        Err(ImportError::InvalidTimestamp(raw.to_string()))
    }
}

/// Parse and validate an export document for `kind`.
pub fn parse_export(
    kind: ContentKind,
    json: &str,
) -> Result<(Vec<ContentRecord>, String, String), ImportError> {
    let document: Value =
        serde_json::from_str(json).map_err(|e| ImportError::InvalidJson(e.to_string()))?;
    let document = document.as_object().ok_or(ImportError::NotAnObject)?;

    let items = document
        .get(kind.collection_name())
        .filter(|items| items.is_array())
        .ok_or(ImportError::MissingCollection(kind.collection_name()))?;

    let exported_at = ["exportedAt", "exportDate"]
        .iter()
        .find_map(|field| document.get(*field).and_then(Value::as_str))
        .ok_or(ImportError::MissingTimestamp)?;
    check_timestamp(exported_at)?;

    let version = document
        .get("version")
        .and_then(Value::as_str)
        .ok_or(ImportError::MissingVersion)?;

    let records = validate_collection::<ContentRecord>(items)
        .map_err(|violations| ImportError::InvalidRecords(describe(&violations)))?;

    let mut ids = BTreeSet::new();
    if let Some(duplicate) = records.iter().find(|record| !ids.insert(record.id)) {
        return Err(ImportError::DuplicateId(duplicate.id.get()));
    }

    Ok((records, exported_at.to_string(), version.to_string()))
}

/// Serialize the collection into an export document.
pub fn export_collection<R>(repo: &R, kind: ContentKind, version: &str) -> ServiceResult<ExportFile>
where
    R: ContentReader,
{
    let records = repo
        .list_content(kind)
        .map_err(|e| log_and_map("Failed to list content for export", e))?;
    let now = Utc::now();

    let items = serde_json::to_value(&records).map_err(|e| {
        log::error!("Failed to encode {kind} for export: {e}");
        ServiceError::Internal
    })?;
    let mut document = Map::new();
    document.insert(kind.collection_name().to_string(), items);
    document.insert("exportedAt".to_string(), Value::String(now.to_rfc3339()));
    document.insert("version".to_string(), Value::String(version.to_string()));

    let bytes = serde_json::to_vec_pretty(&document).map_err(|e| {
        log::error!("Failed to render {kind} export: {e}");
        ServiceError::Internal
    })?;
    log::info!("exported {} {kind} record(s)", records.len());

    Ok(ExportFile {
        file_name: format!("mblog-{}-{}.json", kind.collection_name(), now.format("%Y-%m-%d")),
        content_type: "application/json",
        bytes,
    })
}

/// Replace the collection with the records of an export document.
pub fn import_collection<R>(repo: &R, kind: ContentKind, json: &str) -> ServiceResult<ImportReport>
where
    R: ContentWriter,
{
    let (records, exported_at, version) = parse_export(kind, json).map_err(|e| {
        log::warn!("Rejected {kind} import: {e}");
        ServiceError::from(e)
    })?;

    repo.replace_content(kind, &records)
        .map_err(|e| log_and_map("Failed to import content", e))?;

    Ok(ImportReport {
        collection: kind.collection_name(),
        imported: records.len(),
        version,
        exported_at,
    })
}
