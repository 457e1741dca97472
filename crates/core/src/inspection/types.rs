//! Inspection domain types.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checklist::{ChecklistData, ChecklistSummary};
use crate::application::Application;
use crate::workflow::{ApplicationStatus, CertificateType};

/// A recorded inspection. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionChecklist {
    /// Checklist ID.
    pub id: Uuid,
    /// Inspected application.
    pub application_id: Uuid,
    /// Certificate type at the time of inspection.
    pub certificate_type: CertificateType,
    /// Inspector who filed it.
    pub inspector_id: Uuid,
    /// Inspector display name at the time of filing.
    pub inspector_name: String,
    /// Checklist contents.
    pub checklist_data: ChecklistData,
    /// Storage keys of the photos.
    pub images: Vec<String>,
    /// Date of the visit.
    pub inspection_date: NaiveDate,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl InspectionChecklist {
    /// Tally of item results.
    #[must_use]
    pub fn summary(&self) -> ChecklistSummary {
        self.checklist_data.summary()
    }
}

/// Checklist row handed to the repository.
#[derive(Debug, Clone)]
pub struct NewChecklist {
    /// Checklist ID.
    pub id: Uuid,
    /// Application ID.
    pub application_id: Uuid,
    /// Certificate type.
    pub certificate_type: CertificateType,
    /// Inspector.
    pub inspector_id: Uuid,
    /// Snapshot of the inspector display name.
    pub inspector_name: String,
    /// Checklist contents.
    pub checklist_data: ChecklistData,
    /// Photo storage keys.
    pub images: Vec<String>,
    /// Date of the visit.
    pub inspection_date: NaiveDate,
}

/// A photo received with an inspection.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Original file name.
    pub filename: String,
    /// Declared MIME type; must be `image/*`.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

/// Input for recording an inspection.
#[derive(Debug, Clone)]
pub struct RecordInspectionInput {
    /// Filled-in checklist.
    pub checklist: ChecklistData,
    /// Site photos.
    pub images: Vec<ImageUpload>,
    /// Visit date; defaults to the scheduled date, then today.
    pub inspection_date: Option<NaiveDate>,
}

/// Assignment row as read from storage, before owner names are attached.
#[derive(Debug, Clone)]
pub struct AssignmentRow {
    /// The application.
    pub application: Application,
    /// Establishment name.
    pub establishment_name: String,
    /// Establishment owner.
    pub owner_id: Uuid,
}

/// An application on an inspector's worklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Application ID.
    pub application_id: Uuid,
    /// Certificate type.
    pub certificate_type: CertificateType,
    /// Application status.
    pub status: ApplicationStatus,
    /// Establishment ID.
    pub establishment_id: Uuid,
    /// Establishment name.
    pub establishment_name: String,
    /// Owner display name; empty if the owner profile is gone.
    pub owner_name: String,
    /// Scheduled date.
    pub inspection_date: Option<NaiveDate>,
    /// Scheduled time.
    pub inspection_time: Option<NaiveTime>,
    /// Priority flag.
    pub priority: bool,
    /// When the owner applied.
    pub applied_at: DateTime<Utc>,
}
