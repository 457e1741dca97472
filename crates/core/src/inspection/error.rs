//! Inspection error types.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AccessDenied;
use crate::storage::StorageError;
use crate::workflow::WorkflowError;

/// Inspection operation errors.
#[derive(Debug, Error)]
pub enum InspectionError {
    /// Application not found.
    #[error("application not found: {0}")]
    ApplicationNotFound(Uuid),

    /// Inspector not found.
    #[error("inspector not found: {0}")]
    InspectorNotFound(Uuid),

    /// Checklist or photos failed validation.
    #[error("{0}")]
    Validation(String),

    /// Caller lacks the role or is not the assigned inspector.
    #[error("{0}")]
    Forbidden(String),

    /// Photos were sent but object storage is not configured.
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

impl InspectionError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ApplicationNotFound(_) | Self::InspectorNotFound(_) => 404,
            Self::Validation(_) => 400,
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
            Self::ApplicationNotFound(_) => "APPLICATION_NOT_FOUND",
            Self::InspectorNotFound(_) => "INSPECTOR_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::Workflow(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AccessDenied> for InspectionError {
    fn from(err: AccessDenied) -> Self {
        Self::Forbidden(err.0)
    }
}
