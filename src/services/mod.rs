//! Admin-facing operations.
//!
//! Services are generic over the repository traits. Repository failures are
//! logged here and mapped to [`ServiceError`].

use crate::error::RepositoryError;

pub mod errors;
pub mod import_export;
pub mod maintenance;

pub use errors::{ServiceError, ServiceResult};

/// Log `err` with `context` and map it to the matching [`ServiceError`].
pub(crate) fn log_and_map(context: &str, err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound | RepositoryError::BackupUnavailable(_) => {
            log::warn!("{context}: {err}");
            ServiceError::NotFound
        }
        RepositoryError::Validation(message) => {
            log::warn!("{context}: {message}");
            ServiceError::Form(message)
        }
        RepositoryError::SchemaInvalid(violations) => {
            log::warn!("{context}: {}", violations.join("; "));
            ServiceError::Form(violations.join("; "))
        }
        RepositoryError::IndexOutOfRange { .. } => {
            log::warn!("{context}: {err}");
            ServiceError::Form(err.to_string())
        }
        RepositoryError::StorageFull { .. } => {
            log::error!("{context}: {err}");
            ServiceError::StorageFull(err.to_string())
        }
        RepositoryError::DataCorrupted(_) | RepositoryError::Storage(_) => {
            log::error!("{context}: {err}");
            ServiceError::Internal
        }
    }
}
