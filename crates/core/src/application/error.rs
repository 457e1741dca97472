//! Application error types.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AccessDenied;
use crate::storage::StorageError;
use crate::workflow::WorkflowError;

/// Application operation errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Application not found.
    #[error("application not found: {0}")]
    NotFound(Uuid),

    /// Establishment not found.
    #[error("establishment not found: {0}")]
    EstablishmentNotFound(Uuid),

    /// Document not found.
    #[error("document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Applications need a registered establishment.
    #[error("establishment must be registered before applying (current status: {status})")]
    EstablishmentNotRegistered {
        /// Current establishment status.
        status: &'static str,
    },

    /// Target of a schedule is not an active inspector.
    #[error("user {0} is not an active inspector")]
    InvalidInspector(Uuid),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Caller lacks the role, ownership, or assignment.
    #[error("{0}")]
    Forbidden(String),

    /// Object storage is not configured on this server.
    #[error("file storage is not configured")]
    StorageUnavailable,

    /// Status change rejected by the workflow.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Storage operation failed or rejected an upload.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl ApplicationError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::EstablishmentNotFound(_) | Self::DocumentNotFound(_) => 404,
            Self::EstablishmentNotRegistered { .. }
            | Self::InvalidInspector(_)
            | Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::StorageUnavailable => 503,
            Self::Workflow(e) => e.status_code(),
            Self::Storage(e) => e.status_code(),
            Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "APPLICATION_NOT_FOUND",
            Self::EstablishmentNotFound(_) => "ESTABLISHMENT_NOT_FOUND",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::EstablishmentNotRegistered { .. } => "ESTABLISHMENT_NOT_REGISTERED",
            Self::InvalidInspector(_) => "INVALID_INSPECTOR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::Workflow(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AccessDenied> for ApplicationError {
    fn from(err: AccessDenied) -> Self {
        Self::Forbidden(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_codes() {
        let err = ApplicationError::from(WorkflowError::ConcurrentModification);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "CONCURRENT_MODIFICATION");

        let err = ApplicationError::from(StorageError::file_too_large(2, 1));
        assert_eq!(err.status_code(), 413);
    }

    #[test]
    fn test_not_registered_message() {
        let err = ApplicationError::EstablishmentNotRegistered { status: "pending" };
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("pending"));
    }
}
