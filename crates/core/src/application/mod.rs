//! Certification applications.
//!
//! Owners submit FSEC, FSIC-Occupancy, and FSIC-Business applications with
//! supporting documents; admins schedule inspections and decide. Every status
//! change is checked by [`crate::workflow::ApplicationWorkflow`] and written
//! with a compare-and-swap on the status that was read.

mod error;
mod service;
mod types;

pub use error::ApplicationError;
pub use service::{ApplicationRepository, ApplicationService, MAX_DOCUMENTS_PER_APPLICATION};
pub use types::{
    Application, ApplicationDocument, ApplicationFilter, ApplicationTransition, ApplicationUpdate,
    ApplicationWithDocuments, DecisionInput, DocumentDownload, DocumentUpload, NewApplication,
    NewDocument, ReinspectInput, ScheduleInput, SubmitApplicationInput,
};
