//! State transition logic for establishments and applications.
//!
//! Both workflows are stateless: callers pass in the current status and get
//! back the next one or a `WorkflowError`. Persisting the result is the
//! caller's job, and must compare-and-swap on the status that was read.

use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    ApplicationAction, ApplicationStatus, CertificateType, Decision, EstablishmentAction,
    EstablishmentStatus,
};

/// Registration workflow for establishments.
pub struct EstablishmentWorkflow;

impl EstablishmentWorkflow {
    /// Returns the status an action leads to.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InvalidTransition` if the action is not allowed from `current`.
    pub fn transition(
        current: EstablishmentStatus,
        action: EstablishmentAction,
    ) -> Result<EstablishmentStatus, WorkflowError> {
        use EstablishmentAction as A;
        use EstablishmentStatus as S;

        match (current, action) {
            (S::Unregistered, A::Register) | (S::Rejected, A::Resubmit) => Ok(S::Pending),
            (S::Pending, A::Approve) => Ok(S::Registered),
            (S::Pending, A::Reject) => Ok(S::Rejected),
            _ => Err(WorkflowError::InvalidTransition {
                subject: "establishment",
                action: action.as_str(),
                from: current.as_str(),
            }),
        }
    }

    /// Register an unregistered establishment at `address`.
    ///
    /// # Errors
    ///
    /// `AddressRequired` for a blank address, otherwise as [`Self::transition`].
    pub fn register(
        current: EstablishmentStatus,
        address: &str,
    ) -> Result<EstablishmentStatus, WorkflowError> {
        if address.trim().is_empty() {
            return Err(WorkflowError::AddressRequired);
        }
        Self::transition(current, EstablishmentAction::Register)
    }

    /// Reject a pending establishment.
    ///
    /// # Errors
    ///
    /// `ReasonRequired` for a blank reason, otherwise as [`Self::transition`].
    pub fn reject(
        current: EstablishmentStatus,
        reason: &str,
    ) -> Result<EstablishmentStatus, WorkflowError> {
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReasonRequired);
        }
        Self::transition(current, EstablishmentAction::Reject)
    }

    /// Actions available from `current`.
    #[must_use]
    pub fn allowed_actions(current: EstablishmentStatus) -> Vec<EstablishmentAction> {
        EstablishmentAction::ALL
            .into_iter()
            .filter(|action| Self::transition(current, *action).is_ok())
            .collect()
    }

    /// Check if a status change is reachable by a single action.
    #[must_use]
    pub fn is_valid_transition(from: EstablishmentStatus, to: EstablishmentStatus) -> bool {
        EstablishmentAction::ALL
            .into_iter()
            .any(|action| Self::transition(from, action) == Ok(to))
    }
}

/// Certification workflow for applications.
///
/// FSEC goes straight from `pending` to a decision. Occupancy and business
/// certificates pass through `for_inspection` and `inspected` first.
pub struct ApplicationWorkflow;

impl ApplicationWorkflow {
    /// Returns the status an action leads to for a given certificate type.
    ///
    /// # Errors
    ///
    /// `WorkflowError::InvalidTransition` if the action is not allowed from `current`.
    pub fn transition(
        certificate: CertificateType,
        current: ApplicationStatus,
        action: ApplicationAction,
    ) -> Result<ApplicationStatus, WorkflowError> {
        use ApplicationAction as A;
        use ApplicationStatus as S;

        let next = if certificate.requires_inspection() {
            match (current, action) {
                (S::Pending | S::ForInspection, A::Schedule) | (S::Inspected, A::Reinspect) => {
                    Some(S::ForInspection)
                }
                (S::ForInspection, A::RecordInspection) => Some(S::Inspected),
                (S::Inspected, A::Approve) => Some(S::Approved),
                (S::Inspected, A::Reject) => Some(S::Rejected),
                _ => None,
            }
        } else {
            match (current, action) {
                (S::Pending, A::Approve) => Some(S::Approved),
                (S::Pending, A::Reject) => Some(S::Rejected),
                _ => None,
            }
        };

        next.ok_or(WorkflowError::InvalidTransition {
            subject: certificate.label(),
            action: action.as_str(),
            from: current.as_str(),
        })
    }

    /// Apply an admin decision.
    ///
    /// The state check runs first so that deciding an already-decided
    /// application reports the transition error, not a missing reason.
    ///
    /// # Errors
    ///
    /// As [`Self::transition`]; `ReasonRequired` when rejecting without a reason.
    pub fn decide(
        certificate: CertificateType,
        current: ApplicationStatus,
        decision: Decision,
        rejection_reason: Option<&str>,
    ) -> Result<ApplicationStatus, WorkflowError> {
        let next = Self::transition(certificate, current, decision.action())?;
        if decision == Decision::Rejected
            && rejection_reason.is_none_or(|reason| reason.trim().is_empty())
        {
            return Err(WorkflowError::ReasonRequired);
        }
        Ok(next)
    }

    /// Send an inspected application back for another visit.
    ///
    /// # Errors
    ///
    /// As [`Self::transition`]; `ReasonRequired` for a blank reason.
    pub fn reinspect(
        certificate: CertificateType,
        current: ApplicationStatus,
        reason: &str,
    ) -> Result<ApplicationStatus, WorkflowError> {
        let next = Self::transition(certificate, current, ApplicationAction::Reinspect)?;
        if reason.trim().is_empty() {
            return Err(WorkflowError::ReasonRequired);
        }
        Ok(next)
    }

    /// Actions available for an application of `certificate` type in `current`.
    #[must_use]
    pub fn allowed_actions(
        certificate: CertificateType,
        current: ApplicationStatus,
    ) -> Vec<ApplicationAction> {
        ApplicationAction::ALL
            .into_iter()
            .filter(|action| Self::transition(certificate, current, *action).is_ok())
            .collect()
    }

    /// Check if a status change is reachable by a single action.
    #[must_use]
    pub fn is_valid_transition(
        certificate: CertificateType,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> bool {
        ApplicationAction::ALL
            .into_iter()
            .any(|action| Self::transition(certificate, from, action) == Ok(to))
    }
}
