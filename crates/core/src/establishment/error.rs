//! Establishment error types.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::AccessDenied;
use crate::workflow::WorkflowError;

/// Establishment operation errors.
#[derive(Debug, Error)]
pub enum EstablishmentError {
    /// Establishment not found.
    #[error("establishment not found: {0}")]
    NotFound(Uuid),

    /// Another establishment already uses the DTI number.
    #[error("an establishment with DTI number '{0}' already exists")]
    DuplicateDtiNumber(String),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Caller lacks the role or ownership.
    #[error("{0}")]
    Forbidden(String),

    /// Status change rejected by the workflow.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl EstablishmentError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::DuplicateDtiNumber(_) => 409,
            Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::Workflow(e) => e.status_code(),
            Self::Repository(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "ESTABLISHMENT_NOT_FOUND",
            Self::DuplicateDtiNumber(_) => "DUPLICATE_DTI_NUMBER",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Workflow(e) => e.error_code(),
            Self::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<AccessDenied> for EstablishmentError {
    fn from(err: AccessDenied) -> Self {
        Self::Forbidden(err.0)
    }
}
