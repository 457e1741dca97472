//! Property-based tests for the status workflows.

use proptest::prelude::*;

use crate::workflow::error::WorkflowError;
use crate::workflow::service::{ApplicationWorkflow, EstablishmentWorkflow};
use crate::workflow::types::{
    ApplicationAction, ApplicationStatus, CertificateType, Decision, EstablishmentAction,
    EstablishmentStatus,
};

fn arb_establishment_status() -> impl Strategy<Value = EstablishmentStatus> {
    prop::sample::select(EstablishmentStatus::ALL.to_vec())
}

fn arb_establishment_action() -> impl Strategy<Value = EstablishmentAction> {
    prop::sample::select(EstablishmentAction::ALL.to_vec())
}

fn arb_certificate() -> impl Strategy<Value = CertificateType> {
    prop::sample::select(CertificateType::ALL.to_vec())
}

fn arb_application_status() -> impl Strategy<Value = ApplicationStatus> {
    prop::sample::select(ApplicationStatus::ALL.to_vec())
}

fn arb_application_action() -> impl Strategy<Value = ApplicationAction> {
    prop::sample::select(ApplicationAction::ALL.to_vec())
}

/// Strategy for whitespace-only or empty reasons.
fn arb_blank_reason() -> impl Strategy<Value = String> {
    "[ \t]{0,8}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any sequence of actions keeps an establishment inside the four known
    /// statuses, and `registered` is only reached through `pending`.
    #[test]
    fn prop_establishment_walk_never_skips_admin_gate(
        actions in prop::collection::vec(arb_establishment_action(), 0..20)
    ) {
        let mut status = EstablishmentStatus::Unregistered;
        for action in actions {
            if let Ok(next) = EstablishmentWorkflow::transition(status, action) {
                if next == EstablishmentStatus::Registered {
                    prop_assert_eq!(status, EstablishmentStatus::Pending);
                }
                status = next;
            }
        }
        prop_assert!(EstablishmentStatus::ALL.contains(&status));
    }

    /// Failed establishment transitions name the status they were attempted from.
    #[test]
    fn prop_establishment_invalid_transition_reports_origin(
        status in arb_establishment_status(),
        action in arb_establishment_action(),
    ) {
        match EstablishmentWorkflow::transition(status, action) {
            Ok(next) => prop_assert!(EstablishmentWorkflow::is_valid_transition(status, next)),
            Err(WorkflowError::InvalidTransition { from, .. }) => {
                prop_assert_eq!(from, status.as_str());
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// Status never moves backwards except through schedule or reinspect.
    #[test]
    fn prop_application_status_never_regresses(
        cert in arb_certificate(),
        status in arb_application_status(),
        action in arb_application_action(),
    ) {
        if let Ok(next) = ApplicationWorkflow::transition(cert, status, action) {
            let allowed_regression = matches!(
                action,
                ApplicationAction::Schedule | ApplicationAction::Reinspect
            );
            prop_assert!(next.rank() >= status.rank() || allowed_regression);
            prop_assert!(!status.is_final(), "decided applications are terminal");
        }
    }

    /// Every status an application can reach is one its type allows.
    #[test]
    fn prop_application_walk_stays_reachable(
        cert in arb_certificate(),
        actions in prop::collection::vec(arb_application_action(), 0..20),
    ) {
        let mut status = ApplicationStatus::Pending;
        for action in actions {
            if let Ok(next) = ApplicationWorkflow::transition(cert, status, action) {
                status = next;
            }
            prop_assert!(cert.reachable_statuses().contains(&status));
        }
    }

    /// Decisions succeed only from pending (FSEC) or inspected (FSIC).
    #[test]
    fn prop_decision_requires_expected_prestate(
        cert in arb_certificate(),
        status in arb_application_status(),
    ) {
        let expected = if cert.requires_inspection() {
            ApplicationStatus::Inspected
        } else {
            ApplicationStatus::Pending
        };
        let result = ApplicationWorkflow::decide(cert, status, Decision::Approved, None);
        if status == expected {
            prop_assert_eq!(result, Ok(ApplicationStatus::Approved));
        } else {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
            prop_assert!(is_invalid);
        }
    }

    /// A blank rejection reason never yields a rejected application.
    #[test]
    fn prop_blank_reason_never_rejects(
        cert in arb_certificate(),
        status in arb_application_status(),
        reason in arb_blank_reason(),
    ) {
        let result = ApplicationWorkflow::decide(cert, status, Decision::Rejected, Some(&reason));
        prop_assert!(result.is_err());
    }

    /// A non-blank reason from the right pre-state always rejects.
    #[test]
    fn prop_reason_allows_rejection(
        cert in arb_certificate(),
        reason in "[a-zA-Z][a-zA-Z0-9 ]{0,60}",
    ) {
        let from = if cert.requires_inspection() {
            ApplicationStatus::Inspected
        } else {
            ApplicationStatus::Pending
        };
        prop_assert_eq!(
            ApplicationWorkflow::decide(cert, from, Decision::Rejected, Some(&reason)),
            Ok(ApplicationStatus::Rejected)
        );
    }
}
