//! Workflow domain types for registration and certification lifecycles.
//!
//! Statuses are stored as Postgres enums; the string forms here match the
//! enum labels exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration status of an establishment.
///
/// The valid transitions are:
/// - Unregistered → Pending (register)
/// - Pending → Registered (approve)
/// - Pending → Rejected (reject)
/// - Rejected → Pending (resubmit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentStatus {
    /// Created without an address; not yet submitted.
    Unregistered,
    /// Submitted and waiting for an admin.
    Pending,
    /// Approved; may apply for certificates.
    Registered,
    /// Turned down by an admin; may be resubmitted.
    Rejected,
}

impl EstablishmentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Unregistered,
        Self::Pending,
        Self::Registered,
        Self::Rejected,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Pending => "pending",
            Self::Registered => "registered",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unregistered" => Some(Self::Unregistered),
            "pending" => Some(Self::Pending),
            "registered" => Some(Self::Registered),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for EstablishmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Certificate an application is filed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    /// Fire Safety Evaluation Clearance. Decided on documents alone.
    Fsec,
    /// Fire Safety Inspection Certificate for occupancy.
    FsicOccupancy,
    /// Fire Safety Inspection Certificate for business.
    FsicBusiness,
}

impl CertificateType {
    /// Every certificate type.
    pub const ALL: [Self; 3] = [Self::Fsec, Self::FsicOccupancy, Self::FsicBusiness];

    /// Returns the string representation of the certificate type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fsec => "fsec",
            Self::FsicOccupancy => "fsic_occupancy",
            Self::FsicBusiness => "fsic_business",
        }
    }

    /// Parses a certificate type, accepting both `fsic_business` and `FSIC-Business`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fsec" => Some(Self::Fsec),
            "fsic_occupancy" => Some(Self::FsicOccupancy),
            "fsic_business" => Some(Self::FsicBusiness),
            _ => None,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fsec => "FSEC",
            Self::FsicOccupancy => "FSIC-Occupancy",
            Self::FsicBusiness => "FSIC-Business",
        }
    }

    /// Returns true if the certificate is only granted after an on-site inspection.
    #[must_use]
    pub const fn requires_inspection(&self) -> bool {
        matches!(self, Self::FsicOccupancy | Self::FsicBusiness)
    }

    /// Statuses an application of this type can ever hold.
    #[must_use]
    pub fn reachable_statuses(&self) -> &'static [ApplicationStatus] {
        if self.requires_inspection() {
            &ApplicationStatus::ALL
        } else {
            &[
                ApplicationStatus::Pending,
                ApplicationStatus::Approved,
                ApplicationStatus::Rejected,
            ]
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a certification application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Submitted, waiting for an admin.
    Pending,
    /// Inspector assigned and scheduled.
    ForInspection,
    /// Inspection recorded, waiting for a decision.
    Inspected,
    /// Certificate granted.
    Approved,
    /// Certificate refused.
    Rejected,
}

impl ApplicationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::ForInspection,
        Self::Inspected,
        Self::Approved,
        Self::Rejected,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ForInspection => "for_inspection",
            Self::Inspected => "inspected",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "for_inspection" => Some(Self::ForInspection),
            "inspected" => Some(Self::Inspected),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once a decision has been made.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Position in the lifecycle. Decisions share the last rank.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::ForInspection => 1,
            Self::Inspected => 2,
            Self::Approved | Self::Rejected => 3,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Actions that move an establishment between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentAction {
    /// Owner submits the establishment with its address.
    Register,
    /// Owner resubmits after a rejection.
    Resubmit,
    /// Admin accepts the registration.
    Approve,
    /// Admin turns the registration down.
    Reject,
}

impl EstablishmentAction {
    /// Every action.
    pub const ALL: [Self; 4] = [Self::Register, Self::Resubmit, Self::Approve, Self::Reject];

    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Resubmit => "resubmit",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Actions that move an application between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationAction {
    /// Admin assigns (or reassigns) an inspector and a date.
    Schedule,
    /// Assigned inspector files the checklist.
    RecordInspection,
    /// Admin sends an inspected application back for another visit.
    Reinspect,
    /// Admin grants the certificate.
    Approve,
    /// Admin refuses the certificate.
    Reject,
}

impl ApplicationAction {
    /// Every action.
    pub const ALL: [Self; 5] = [
        Self::Schedule,
        Self::RecordInspection,
        Self::Reinspect,
        Self::Approve,
        Self::Reject,
    ];

    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::RecordInspection => "record_inspection",
            Self::Reinspect => "reinspect",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

/// Outcome an admin chooses for an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Grant the certificate.
    Approved,
    /// Refuse the certificate.
    Rejected,
}

impl Decision {
    /// The action this decision performs.
    #[must_use]
    pub const fn action(&self) -> ApplicationAction {
        match self {
            Self::Approved => ApplicationAction::Approve,
            Self::Rejected => ApplicationAction::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establishment_status_round_trip() {
        for status in EstablishmentStatus::ALL {
            assert_eq!(EstablishmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            EstablishmentStatus::parse("PENDING"),
            Some(EstablishmentStatus::Pending)
        );
        assert_eq!(EstablishmentStatus::parse("approved"), None);
    }

    #[test]
    fn test_application_status_round_trip() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApplicationStatus::parse("for inspection"), None);
    }

    #[test]
    fn test_certificate_type_parse_accepts_labels() {
        for cert in CertificateType::ALL {
            assert_eq!(CertificateType::parse(cert.as_str()), Some(cert));
            assert_eq!(CertificateType::parse(cert.label()), Some(cert));
        }
    }

    #[test]
    fn test_fsec_never_reaches_inspection_states() {
        let fsec = CertificateType::Fsec.reachable_statuses();
        assert!(!fsec.contains(&ApplicationStatus::ForInspection));
        assert!(!fsec.contains(&ApplicationStatus::Inspected));
        assert_eq!(CertificateType::FsicBusiness.reachable_statuses().len(), 5);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::ForInspection).unwrap();
        assert_eq!(json, "\"for_inspection\"");
        let cert: CertificateType = serde_json::from_str("\"fsic_occupancy\"").unwrap();
        assert_eq!(cert, CertificateType::FsicOccupancy);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", EstablishmentStatus::Unregistered), "unregistered");
        assert_eq!(format!("{}", ApplicationStatus::Inspected), "inspected");
    }
}
