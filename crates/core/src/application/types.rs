//! Certification application domain types.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::PresignedUrl;
use crate::workflow::{ApplicationStatus, CertificateType, Decision};

/// A certification application for an establishment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application ID.
    pub id: Uuid,
    /// Establishment the certificate is for.
    pub establishment_id: Uuid,
    /// Certificate applied for.
    pub certificate_type: CertificateType,
    /// Current status.
    pub status: ApplicationStatus,
    /// When the owner submitted the application.
    pub applied_at: DateTime<Utc>,
    /// Assigned inspector.
    pub inspector_id: Option<Uuid>,
    /// Scheduled inspection date.
    pub inspection_date: Option<NaiveDate>,
    /// Scheduled inspection time.
    pub inspection_time: Option<NaiveTime>,
    /// Priority flag set at scheduling.
    pub priority: bool,
    /// Reason for rejection.
    pub rejection_reason: Option<String>,
    /// Link to the issued certificate.
    pub certificate_url: Option<String>,
    /// Admin note, e.g. why a reinspection was ordered.
    pub remarks: Option<String>,
    /// Owner who submitted.
    pub submitted_by: Uuid,
    /// Admin who decided.
    pub decided_by: Option<Uuid>,
    /// When the decision was made.
    pub decided_at: Option<DateTime<Utc>>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Updated at.
    pub updated_at: DateTime<Utc>,
}

/// Metadata of a document uploaded with an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDocument {
    /// Document ID.
    pub id: Uuid,
    /// Parent application.
    pub application_id: Uuid,
    /// Free-text label such as `building_plan`.
    pub document_type: String,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Storage provider the object lives in.
    pub storage_provider: String,
    /// Bucket or container.
    pub storage_bucket: String,
    /// Object key.
    #[serde(skip_serializing)]
    pub storage_key: String,
    /// Uploader.
    pub uploaded_by: Uuid,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

/// A file received with a submission.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Free-text label such as `building_plan`.
    pub document_type: String,
    /// Original file name.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

/// Input for submitting an application.
#[derive(Debug, Clone)]
pub struct SubmitApplicationInput {
    /// Establishment to certify.
    pub establishment_id: Uuid,
    /// Certificate applied for.
    pub certificate_type: CertificateType,
    /// Supporting documents.
    pub documents: Vec<DocumentUpload>,
}

/// An application together with its documents.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithDocuments {
    /// The application.
    #[serde(flatten)]
    pub application: Application,
    /// Its documents.
    pub documents: Vec<ApplicationDocument>,
}

/// Input for assigning an inspector.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleInput {
    /// Inspector to assign.
    pub inspector_id: Uuid,
    /// Inspection date.
    pub inspection_date: NaiveDate,
    /// Inspection time.
    pub inspection_time: NaiveTime,
    /// Priority flag.
    #[serde(default)]
    pub priority: bool,
}

/// Input for ordering a reinspection.
#[derive(Debug, Clone, Deserialize)]
pub struct ReinspectInput {
    /// Inspector to assign.
    pub inspector_id: Uuid,
    /// New inspection date.
    pub inspection_date: NaiveDate,
    /// New inspection time.
    pub inspection_time: NaiveTime,
    /// Why another visit is needed.
    pub reason: String,
}

/// Input for an approval or rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionInput {
    /// Outcome.
    pub decision: Decision,
    /// Required when rejecting.
    pub rejection_reason: Option<String>,
    /// Issued certificate link, only kept on approval.
    pub certificate_url: Option<String>,
}

/// Filter for listing applications.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApplicationFilter {
    /// Only this certificate type.
    pub certificate_type: Option<CertificateType>,
    /// Only this status.
    pub status: Option<ApplicationStatus>,
    /// Only applications for this establishment.
    pub establishment_id: Option<Uuid>,
    /// Only applications for establishments of this owner. Forced for owners.
    #[serde(skip)]
    pub owner_id: Option<Uuid>,
    /// Only applications assigned to this inspector. Forced for inspectors.
    #[serde(skip)]
    pub inspector_id: Option<Uuid>,
}

/// Row handed to the repository on insert.
#[derive(Debug, Clone)]
pub struct NewApplication {
    /// Application ID.
    pub id: Uuid,
    /// Establishment ID.
    pub establishment_id: Uuid,
    /// Certificate type.
    pub certificate_type: CertificateType,
    /// Submitting owner.
    pub submitted_by: Uuid,
    /// Submission time.
    pub applied_at: DateTime<Utc>,
}

/// Document row handed to the repository on insert.
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Document ID.
    pub id: Uuid,
    /// Parent application.
    pub application_id: Uuid,
    /// Label.
    pub document_type: String,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Storage provider.
    pub storage_provider: String,
    /// Bucket or container.
    pub storage_bucket: String,
    /// Object key.
    pub storage_key: String,
    /// Uploader.
    pub uploaded_by: Uuid,
}

/// Field changes that accompany a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationUpdate {
    /// Assign an inspector and a slot.
    Schedule {
        /// Inspector.
        inspector_id: Uuid,
        /// Date.
        inspection_date: NaiveDate,
        /// Time.
        inspection_time: NaiveTime,
        /// Priority flag.
        priority: bool,
    },
    /// Reassign for another visit, noting why.
    Reinspect {
        /// Inspector.
        inspector_id: Uuid,
        /// Date.
        inspection_date: NaiveDate,
        /// Time.
        inspection_time: NaiveTime,
        /// Stored in `remarks`.
        reason: String,
    },
    /// Record the admin decision.
    Decide {
        /// Admin.
        decided_by: Uuid,
        /// Decision time.
        decided_at: DateTime<Utc>,
        /// Set on rejection.
        rejection_reason: Option<String>,
        /// Set on approval.
        certificate_url: Option<String>,
    },
}

/// A compare-and-swap status change.
#[derive(Debug, Clone)]
pub struct ApplicationTransition {
    /// Application ID.
    pub id: Uuid,
    /// Status the caller read.
    pub expected: ApplicationStatus,
    /// Status to write.
    pub new_status: ApplicationStatus,
    /// Accompanying field changes.
    pub update: ApplicationUpdate,
}

/// How a document is handed to the client.
#[derive(Debug, Clone)]
pub enum DocumentDownload {
    /// The client fetches the object directly.
    Presigned(PresignedUrl),
    /// The provider cannot presign; bytes are streamed through the API.
    Inline {
        /// Document metadata (file name and MIME type for headers).
        document: ApplicationDocument,
        /// File contents.
        data: Bytes,
    },
}
