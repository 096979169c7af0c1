//! Conversions between the error types of the individual layers.

use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;
use crate::error::RepositoryError;
#[cfg(feature = "sqlite")]
use crate::error::StorageError;

impl From<TypeConstraintError> for RepositoryError {
    fn from(val: TypeConstraintError) -> Self {
        RepositoryError::Validation(val.to_string())
    }
}

impl From<ValidationErrors> for RepositoryError {
    fn from(val: ValidationErrors) -> Self {
        RepositoryError::Validation(val.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<diesel::result::Error> for StorageError {
    fn from(val: diesel::result::Error) -> Self {
        StorageError::Backend(val.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<diesel::r2d2::PoolError> for StorageError {
    fn from(val: diesel::r2d2::PoolError) -> Self {
        StorageError::Backend(val.to_string())
    }
}
