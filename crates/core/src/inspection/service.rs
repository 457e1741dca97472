//! Inspection recording and assignment lookup.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::error::InspectionError;
use super::types::{
    Assignment, AssignmentRow, InspectionChecklist, NewChecklist, RecordInspectionInput,
};
use crate::application::Application;
use crate::auth::{Actor, Profile, Role};
use crate::storage::StorageService;
use crate::workflow::{ApplicationAction, ApplicationStatus, ApplicationWorkflow, WorkflowError};

/// Most photos accepted with one inspection.
pub const MAX_INSPECTION_IMAGES: usize = 20;

/// Repository trait for inspection persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait InspectionRepository: Send + Sync {
    /// Find an application by ID.
    fn find_application(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Application>, InspectionError>> + Send;

    /// Find a profile by ID.
    fn find_profile(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Profile>, InspectionError>> + Send;

    /// Find several profiles. Unknown IDs are skipped.
    fn find_profiles(
        &self,
        ids: Vec<Uuid>,
    ) -> impl Future<Output = Result<Vec<Profile>, InspectionError>> + Send;

    /// Insert the checklist and move the application from `for_inspection`
    /// to `inspected`, atomically.
    ///
    /// Returns `None`, with nothing written, when the application is no
    /// longer `for_inspection`.
    fn record_inspection(
        &self,
        checklist: NewChecklist,
    ) -> impl Future<Output = Result<Option<InspectionChecklist>, InspectionError>> + Send;

    /// Occupancy and business applications assigned to an inspector.
    fn list_assignments(
        &self,
        inspector_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> impl Future<Output = Result<Vec<AssignmentRow>, InspectionError>> + Send;
}

/// Inspection service.
pub struct InspectionService<R: InspectionRepository> {
    repo: Arc<R>,
    storage: Option<Arc<StorageService>>,
}

impl<R: InspectionRepository> InspectionService<R> {
    /// Create a new inspection service. Photos need `storage`.
    #[must_use]
    pub fn new(repo: Arc<R>, storage: Option<Arc<StorageService>>) -> Self {
        Self { repo, storage }
    }

    /// Record the assigned inspector's checklist and photos.
    ///
    /// Photos are uploaded first; if the checklist cannot be written they
    /// are deleted again.
    pub async fn record(
        &self,
        actor: &Actor,
        application_id: Uuid,
        input: RecordInspectionInput,
    ) -> Result<InspectionChecklist, InspectionError> {
        actor.require(Role::Inspector)?;

        let application = self
            .repo
            .find_application(application_id)
            .await?
            .ok_or(InspectionError::ApplicationNotFound(application_id))?;
        if application.inspector_id != Some(actor.user_id) {
            return Err(InspectionError::Forbidden(
                "this application is not assigned to you".to_string(),
            ));
        }

        ApplicationWorkflow::transition(
            application.certificate_type,
            application.status,
            ApplicationAction::RecordInspection,
        )?;
        input.checklist.validate().map_err(InspectionError::Validation)?;
        self.validate_images(&input)?;

        let inspector = self
            .repo
            .find_profile(actor.user_id)
            .await?
            .ok_or(InspectionError::InspectorNotFound(actor.user_id))?;

        let checklist_id = Uuid::new_v4();
        let mut image_keys = Vec::with_capacity(input.images.len());
        if let Some(storage) = self.storage.as_deref() {
            for (index, image) in input.images.into_iter().enumerate() {
                let key = StorageService::inspection_image_key(
                    application_id,
                    checklist_id,
                    index,
                    &image.filename,
                );
                if let Err(e) = storage.upload(&key, &image.content_type, image.data).await {
                    storage.delete_all(&image_keys).await;
                    return Err(e.into());
                }
                image_keys.push(key);
            }
        }

        let inspection_date = input
            .inspection_date
            .or(application.inspection_date)
            .unwrap_or_else(|| Utc::now().date_naive());

        let recorded = self
            .repo
            .record_inspection(NewChecklist {
                id: checklist_id,
                application_id,
                certificate_type: application.certificate_type,
                inspector_id: actor.user_id,
                inspector_name: inspector.display_name(),
                checklist_data: input.checklist,
                images: image_keys.clone(),
                inspection_date,
            })
            .await;

        let checklist = match recorded {
            Ok(Some(checklist)) => checklist,
            Ok(None) => {
                self.discard_images(&image_keys).await;
                return Err(WorkflowError::ConcurrentModification.into());
            }
            Err(e) => {
                self.discard_images(&image_keys).await;
                return Err(e);
            }
        };

        let summary = checklist.summary();
        info!(
            application_id = %application_id,
            checklist_id = %checklist.id,
            failed_items = summary.failed,
            images = checklist.images.len(),
            "Inspection recorded"
        );
        Ok(checklist)
    }

    /// Applications assigned to an inspector, soonest first and priority
    /// first within a day. Unscheduled ones come last.
    pub async fn assignments(
        &self,
        actor: &Actor,
        inspector_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Assignment>, InspectionError> {
        match actor.role {
            Role::Admin => {}
            Role::Inspector if actor.user_id == inspector_id => {}
            _ => {
                return Err(InspectionError::Forbidden(
                    "you cannot view this inspector's assignments".to_string(),
                ));
            }
        }

        let inspector = self.repo.find_profile(inspector_id).await?;
        if !inspector.is_some_and(|p| p.role == Role::Inspector) {
            return Err(InspectionError::InspectorNotFound(inspector_id));
        }

        let rows = self.repo.list_assignments(inspector_id, status).await?;

        let mut owner_ids: Vec<Uuid> = rows.iter().map(|row| row.owner_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();
        let owners: HashMap<Uuid, String> = self
            .repo
            .find_profiles(owner_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.display_name()))
            .collect();

        let mut assignments: Vec<Assignment> = rows
            .into_iter()
            .filter(|row| row.application.certificate_type.requires_inspection())
            .map(|row| Assignment {
                application_id: row.application.id,
                certificate_type: row.application.certificate_type,
                status: row.application.status,
                establishment_id: row.application.establishment_id,
                establishment_name: row.establishment_name,
                owner_name: owners.get(&row.owner_id).cloned().unwrap_or_default(),
                inspection_date: row.application.inspection_date,
                inspection_time: row.application.inspection_time,
                priority: row.application.priority,
                applied_at: row.application.applied_at,
            })
            .collect();
        assignments.sort_by(compare_assignments);

        Ok(assignments)
    }

    fn validate_images(&self, input: &RecordInspectionInput) -> Result<(), InspectionError> {
        if input.images.is_empty() {
            return Ok(());
        }
        if input.images.len() > MAX_INSPECTION_IMAGES {
            return Err(InspectionError::Validation(format!(
                "at most {MAX_INSPECTION_IMAGES} images may be attached"
            )));
        }
        let storage = self
            .storage
            .as_deref()
            .ok_or(InspectionError::StorageUnavailable)?;

        for image in &input.images {
            if !image.content_type.starts_with("image/") {
                return Err(InspectionError::Validation(format!(
                    "'{}' is not an image",
                    image.filename
                )));
            }
            storage.validate_upload(&image.filename, &image.content_type, image.data.len() as u64)?;
        }
        Ok(())
    }

    async fn discard_images(&self, keys: &[String]) {
        if let Some(storage) = self.storage.as_deref() {
            storage.delete_all(keys).await;
        }
    }
}

/// Date ascending with unscheduled last, then priority first, then time.
fn compare_assignments(a: &Assignment, b: &Assignment) -> Ordering {
    let date_order = match (a.inspection_date, b.inspection_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    date_order
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.inspection_time.cmp(&b.inspection_time))
        .then_with(|| a.applied_at.cmp(&b.applied_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::checklist::{ChecklistData, ChecklistItem, ChecklistSection, ItemResult};
    use crate::inspection::types::ImageUpload;
    use crate::testing::{MemoryStore, memory_storage};
    use crate::workflow::{CertificateType, EstablishmentStatus};
    use bytes::Bytes;
    use chrono::{Duration, NaiveDate};

    fn checklist() -> ChecklistData {
        ChecklistData {
            sections: vec![ChecklistSection {
                title: "Means of egress".to_string(),
                items: vec![ChecklistItem {
                    label: "Exit signs illuminated".to_string(),
                    result: ItemResult::Pass,
                    remarks: None,
                }],
            }],
            comments: Some("All clear".to_string()),
        }
    }

    fn photo(name: &str) -> ImageUpload {
        ImageUpload {
            filename: name.to_string(),
            content_type: "image/jpeg".to_string(),
            data: Bytes::from_static(b"\xFF\xD8\xFF"),
        }
    }

    fn input(images: Vec<ImageUpload>) -> RecordInspectionInput {
        RecordInspectionInput {
            checklist: checklist(),
            images,
            inspection_date: None,
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        storage: Arc<StorageService>,
        service: InspectionService<MemoryStore>,
        inspector: Actor,
        application: Application,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let storage = memory_storage();
        let service = InspectionService::new(store.clone(), Some(storage.clone()));
        let owner = store.add_actor(Role::Owner);
        let inspector = store.add_actor(Role::Inspector);
        let est = store.add_establishment(owner.user_id, EstablishmentStatus::Registered);
        let application = store.add_application(
            est.id,
            CertificateType::FsicOccupancy,
            ApplicationStatus::ForInspection,
        );
        store.assign(application.id, inspector.user_id, None, false);
        let application = store.application(application.id);
        Fixture {
            store,
            storage,
            service,
            inspector,
            application,
        }
    }

    #[tokio::test]
    async fn test_record_creates_one_checklist_and_marks_inspected() {
        let f = fixture();
        let checklist = f
            .service
            .record(&f.inspector, f.application.id, input(vec![photo("exit.jpg")]))
            .await
            .unwrap();

        assert_eq!(f.store.checklist_count(), 1);
        assert_eq!(
            f.store.application(f.application.id).status,
            ApplicationStatus::Inspected
        );
        assert_eq!(checklist.inspector_name, "Test Inspector");
        assert_eq!(checklist.images.len(), 1);
        assert!(f.storage.read(&checklist.images[0]).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_record_is_invalid_transition() {
        let f = fixture();
        f.service
            .record(&f.inspector, f.application.id, input(vec![]))
            .await
            .unwrap();

        let err = f
            .service
            .record(&f.inspector, f.application.id, input(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(f.store.checklist_count(), 1);
    }

    #[tokio::test]
    async fn test_unassigned_inspector_is_forbidden() {
        let f = fixture();
        let other = f.store.add_actor(Role::Inspector);
        let err = f
            .service
            .record(&other, f.application.id, input(vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(f.store.checklist_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_checklist_is_rejected() {
        let f = fixture();
        let mut bad = input(vec![]);
        bad.checklist.sections.clear();
        let err = f
            .service
            .record(&f.inspector, f.application.id, bad)
            .await
            .unwrap_err();
        assert!(matches!(err, InspectionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_image_attachment_is_rejected() {
        let f = fixture();
        let pdf = ImageUpload {
            content_type: "application/pdf".to_string(),
            ..photo("report.pdf")
        };
        let err = f
            .service
            .record(&f.inspector, f.application.id, input(vec![pdf]))
            .await
            .unwrap_err();
        assert!(matches!(err, InspectionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_lost_race_discards_uploaded_photos() {
        let f = fixture();
        f.store.fail_next_transition();
        let err = f
            .service
            .record(&f.inspector, f.application.id, input(vec![photo("a.jpg")]))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONCURRENT_MODIFICATION");
        assert_eq!(f.store.checklist_count(), 0);
    }

    #[tokio::test]
    async fn test_photos_without_storage_are_unavailable() {
        let f = fixture();
        let service = InspectionService::new(f.store.clone(), None);
        let err = service
            .record(&f.inspector, f.application.id, input(vec![photo("a.jpg")]))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);

        // checklist-only inspections still work
        assert!(
            service
                .record(&f.inspector, f.application.id, input(vec![]))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_assignments_are_ordered_and_named() {
        let f = fixture();
        let owner_id = f.store.establishment_owner(f.application.establishment_id);
        let today = Utc::now().date_naive();

        let later = f.store.add_application(
            f.application.establishment_id,
            CertificateType::FsicBusiness,
            ApplicationStatus::ForInspection,
        );
        f.store
            .assign(later.id, f.inspector.user_id, Some(today + Duration::days(5)), false);

        let urgent = f.store.add_application(
            f.application.establishment_id,
            CertificateType::FsicBusiness,
            ApplicationStatus::ForInspection,
        );
        f.store.assign(urgent.id, f.inspector.user_id, Some(today), true);

        let routine = f.store.add_application(
            f.application.establishment_id,
            CertificateType::FsicOccupancy,
            ApplicationStatus::ForInspection,
        );
        f.store.assign(routine.id, f.inspector.user_id, Some(today), false);

        let list = f
            .service
            .assignments(&f.inspector, f.inspector.user_id, None)
            .await
            .unwrap();
        let order: Vec<Uuid> = list.iter().map(|a| a.application_id).collect();
        assert_eq!(order, vec![urgent.id, routine.id, later.id, f.application.id]);
        assert!(list.iter().all(|a| a.owner_name == f.store.display_name(owner_id)));
        assert!(list.iter().all(|a| a.establishment_name == "Test Establishment"));
    }

    #[tokio::test]
    async fn test_assignments_status_filter_and_access() {
        let f = fixture();
        let inspected = f.service.assignments(
            &f.inspector,
            f.inspector.user_id,
            Some(ApplicationStatus::Inspected),
        );
        assert!(inspected.await.unwrap().is_empty());

        let other = f.store.add_actor(Role::Inspector);
        let err = f
            .service
            .assignments(&other, f.inspector.user_id, None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let admin = f.store.add_actor(Role::Admin);
        assert_eq!(
            f.service
                .assignments(&admin, f.inspector.user_id, None)
                .await
                .unwrap()
                .len(),
            1
        );

        let owner = f.store.add_actor(Role::Owner);
        let err = f
            .service
            .assignments(&admin, owner.user_id, None)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INSPECTOR_NOT_FOUND");
    }

    #[test]
    fn test_compare_assignments_puts_unscheduled_last() {
        let base = Assignment {
            application_id: Uuid::new_v4(),
            certificate_type: CertificateType::FsicBusiness,
            status: ApplicationStatus::ForInspection,
            establishment_id: Uuid::new_v4(),
            establishment_name: String::new(),
            owner_name: String::new(),
            inspection_date: None,
            inspection_time: None,
            priority: true,
            applied_at: Utc::now(),
        };
        let scheduled = Assignment {
            inspection_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            priority: false,
            ..base.clone()
        };
        assert_eq!(compare_assignments(&scheduled, &base), Ordering::Less);
    }
}
