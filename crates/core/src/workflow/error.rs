//! Workflow error types.

use thiserror::Error;

/// Errors raised by the status state machines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The action is not allowed from the current status.
    #[error("cannot {action} a {subject} that is {from}")]
    InvalidTransition {
        /// What is being transitioned (`establishment` or a certificate label).
        subject: &'static str,
        /// The attempted action.
        action: &'static str,
        /// The current status.
        from: &'static str,
    },

    /// A rejection or reinspection was attempted without a reason.
    #[error("a reason is required")]
    ReasonRequired,

    /// Registration was attempted without an address.
    #[error("an address is required")]
    AddressRequired,

    /// The record changed status between read and write.
    #[error("the record was modified by another request; reload and try again")]
    ConcurrentModification,
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } | Self::ReasonRequired | Self::AddressRequired => 400,
            Self::ConcurrentModification => 409,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::AddressRequired => "ADDRESS_REQUIRED",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
        }
    }
}
