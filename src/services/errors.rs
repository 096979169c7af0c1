use thiserror::Error;

/// Generic error type used by service layer functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Requested resource was not found.
    #[error("not found")]
    NotFound,
    /// Submitted input was rejected.
    #[error("invalid input: {0}")]
    Form(String),
    /// A destructive operation was requested without confirmation.
    #[error("operation requires explicit confirmation")]
    Confirmation,
    /// The store is full even after cleanup.
    #[error("storage full: {0}")]
    StorageFull(String),
    /// An unexpected internal error occurred.
    #[error("internal error")]
    Internal,
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;
