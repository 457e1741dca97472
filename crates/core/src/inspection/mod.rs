//! Inspections.
//!
//! The assigned inspector files a checklist (with optional photos) for an
//! application that is `for_inspection`, which moves it to `inspected`.
//! Inspectors and admins can list an inspector's assignments.

pub mod checklist;
mod error;
mod service;
mod types;

pub use checklist::{ChecklistData, ChecklistItem, ChecklistSection, ChecklistSummary, ItemResult};
pub use error::InspectionError;
pub use service::{InspectionRepository, InspectionService, MAX_INSPECTION_IMAGES};
pub use types::{
    Assignment, AssignmentRow, ImageUpload, InspectionChecklist, NewChecklist,
    RecordInspectionInput,
};
