//! Establishment domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::EstablishmentStatus;

/// A business entity registered by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Establishment {
    /// Establishment ID.
    pub id: Uuid,
    /// Profile ID of the owner.
    pub owner_id: Uuid,
    /// Business name.
    pub name: String,
    /// DTI business-name certificate number. Unique.
    pub dti_cert_no: String,
    /// Street address. `None` while unregistered.
    pub address: Option<String>,
    /// Registration status.
    pub status: EstablishmentStatus,
    /// Reason given by the admin for the last rejection.
    pub rejection_reason: Option<String>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an establishment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEstablishmentInput {
    /// Business name.
    pub name: String,
    /// DTI certificate number.
    pub dti_cert_no: String,
}

/// Row handed to the repository on insert.
#[derive(Debug, Clone)]
pub struct NewEstablishment {
    /// Establishment ID.
    pub id: Uuid,
    /// Owner profile ID.
    pub owner_id: Uuid,
    /// Trimmed business name.
    pub name: String,
    /// Trimmed DTI certificate number.
    pub dti_cert_no: String,
}

/// Filter for listing establishments.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EstablishmentFilter {
    /// Only establishments in this status.
    pub status: Option<EstablishmentStatus>,
    /// Only establishments of this owner. Forced for owners.
    #[serde(skip)]
    pub owner_id: Option<Uuid>,
}

/// A compare-and-swap status change.
///
/// Applied only if the row is still in `expected`; `address` replaces the
/// stored one when `Some`, and `rejection_reason` is always written.
#[derive(Debug, Clone)]
pub struct EstablishmentTransition {
    /// Establishment ID.
    pub id: Uuid,
    /// Status the caller read.
    pub expected: EstablishmentStatus,
    /// Status to write.
    pub new_status: EstablishmentStatus,
    /// New address, if changing.
    pub address: Option<String>,
    /// Rejection reason to store (cleared when `None`).
    pub rejection_reason: Option<String>,
}
