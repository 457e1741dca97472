//! Dashboard data types.

use serde::Serialize;
use uuid::Uuid;

use crate::workflow::{ApplicationStatus, CertificateType, EstablishmentStatus};

/// Which records a summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardScope {
    /// Everything (admins).
    All,
    /// Establishments and applications of one owner.
    Owner(Uuid),
    /// Applications assigned to one inspector.
    Inspector(Uuid),
}

/// Number of establishments in a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstablishmentCount {
    /// Status.
    pub status: EstablishmentStatus,
    /// Count.
    pub count: u64,
}

/// Number of applications of a type in a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationCount {
    /// Certificate type.
    pub certificate_type: CertificateType,
    /// Status.
    pub status: ApplicationStatus,
    /// Count.
    pub count: u64,
}

/// Dashboard summary response.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// Establishments by status. Empty for inspectors.
    pub establishments: Vec<EstablishmentCount>,
    /// Applications by certificate type and status, zero rows included.
    pub applications: Vec<ApplicationCount>,
    /// Establishments waiting for registration approval.
    pub pending_registrations: u64,
    /// Applications waiting on an admin (pending, or inspected for FSIC).
    pub awaiting_decision: u64,
    /// Applications currently scheduled for inspection.
    pub scheduled_inspections: u64,
}
