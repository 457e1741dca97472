//! Application service implementation.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use firecert_shared::types::{PageRequest, PageResponse};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::ApplicationError;
use super::types::{
    Application, ApplicationDocument, ApplicationFilter, ApplicationTransition, ApplicationUpdate,
    ApplicationWithDocuments, DecisionInput, DocumentDownload, NewApplication, NewDocument,
    ReinspectInput, ScheduleInput, SubmitApplicationInput,
};
use crate::auth::{Actor, Profile, Role};
use crate::establishment::Establishment;
use crate::inspection::InspectionChecklist;
use crate::storage::{StorageError, StorageService};
use crate::workflow::{
    ApplicationAction, ApplicationWorkflow, Decision, EstablishmentStatus, WorkflowError,
};

/// Most documents accepted with one submission.
pub const MAX_DOCUMENTS_PER_APPLICATION: usize = 10;

/// Longest document type label, in characters.
const MAX_DOCUMENT_TYPE_LENGTH: usize = 100;

/// Longest original file name, in characters.
const MAX_FILE_NAME_LENGTH: usize = 255;

/// Repository trait for application persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ApplicationRepository: Send + Sync {
    /// Find an establishment by ID.
    fn find_establishment(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Establishment>, ApplicationError>> + Send;

    /// Find a profile by ID.
    fn find_profile(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Profile>, ApplicationError>> + Send;

    /// Insert a `pending` application.
    fn create(
        &self,
        input: NewApplication,
    ) -> impl Future<Output = Result<Application, ApplicationError>> + Send;

    /// Delete an application and its document rows.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<(), ApplicationError>> + Send;

    /// Find application by ID.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Application>, ApplicationError>> + Send;

    /// List applications matching a filter, newest first, with the total count.
    fn list(
        &self,
        filter: ApplicationFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<Application>, u64), ApplicationError>> + Send;

    /// Apply a status change if the row is still in `expected`.
    ///
    /// Returns `None` when the status had already changed.
    fn transition(
        &self,
        change: ApplicationTransition,
    ) -> impl Future<Output = Result<Option<Application>, ApplicationError>> + Send;

    /// Insert a document metadata row.
    fn create_document(
        &self,
        input: NewDocument,
    ) -> impl Future<Output = Result<ApplicationDocument, ApplicationError>> + Send;

    /// Documents of an application, in upload order.
    fn list_documents(
        &self,
        application_id: Uuid,
    ) -> impl Future<Output = Result<Vec<ApplicationDocument>, ApplicationError>> + Send;

    /// Find a document by ID.
    fn find_document(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<ApplicationDocument>, ApplicationError>> + Send;

    /// Inspection checklists of an application, oldest first.
    fn list_checklists(
        &self,
        application_id: Uuid,
    ) -> impl Future<Output = Result<Vec<InspectionChecklist>, ApplicationError>> + Send;
}

/// Certification application service.
pub struct ApplicationService<R: ApplicationRepository> {
    repo: Arc<R>,
    storage: Option<Arc<StorageService>>,
}

impl<R: ApplicationRepository> ApplicationService<R> {
    /// Create a new application service. Submissions and downloads need `storage`.
    #[must_use]
    pub fn new(repo: Arc<R>, storage: Option<Arc<StorageService>>) -> Self {
        Self { repo, storage }
    }

    /// Submit an application with its documents.
    ///
    /// Every document is validated before anything is written. If an upload
    /// or insert fails part-way, the uploaded objects and the application row
    /// are removed before the error is returned.
    pub async fn submit(
        &self,
        actor: &Actor,
        input: SubmitApplicationInput,
    ) -> Result<ApplicationWithDocuments, ApplicationError> {
        actor.require(Role::Owner)?;
        let storage = self.storage()?;

        let establishment = self
            .repo
            .find_establishment(input.establishment_id)
            .await?
            .ok_or(ApplicationError::EstablishmentNotFound(input.establishment_id))?;
        actor.require_owner_of(establishment.owner_id)?;
        if establishment.status != EstablishmentStatus::Registered {
            return Err(ApplicationError::EstablishmentNotRegistered {
                status: establishment.status.as_str(),
            });
        }

        validate_documents(storage, &input)?;

        let application = self
            .repo
            .create(NewApplication {
                id: Uuid::new_v4(),
                establishment_id: establishment.id,
                certificate_type: input.certificate_type,
                submitted_by: actor.user_id,
                applied_at: Utc::now(),
            })
            .await?;

        let mut uploaded_keys = Vec::with_capacity(input.documents.len());
        let mut documents = Vec::with_capacity(input.documents.len());
        for upload in input.documents {
            let document_id = Uuid::new_v4();
            let key = StorageService::document_key(application.id, document_id, &upload.filename);
            let file_size = i64::try_from(upload.data.len()).unwrap_or(i64::MAX);

            if let Err(e) = storage
                .upload(&key, &upload.content_type, upload.data)
                .await
            {
                self.undo_submit(storage, application.id, &uploaded_keys).await;
                return Err(e.into());
            }
            uploaded_keys.push(key.clone());

            let document = self
                .repo
                .create_document(NewDocument {
                    id: document_id,
                    application_id: application.id,
                    document_type: upload.document_type.trim().to_string(),
                    file_name: upload.filename,
                    file_size,
                    mime_type: upload.content_type,
                    storage_provider: storage.provider_name().to_string(),
                    storage_bucket: storage.bucket().to_string(),
                    storage_key: key,
                    uploaded_by: actor.user_id,
                })
                .await;
            match document {
                Ok(document) => documents.push(document),
                Err(e) => {
                    self.undo_submit(storage, application.id, &uploaded_keys).await;
                    return Err(e);
                }
            }
        }

        info!(
            application_id = %application.id,
            establishment_id = %establishment.id,
            certificate_type = %application.certificate_type,
            documents = documents.len(),
            "Application submitted"
        );

        Ok(ApplicationWithDocuments {
            application,
            documents,
        })
    }

    async fn undo_submit(&self, storage: &StorageService, application_id: Uuid, keys: &[String]) {
        warn!(application_id = %application_id, "Submission failed, rolling back");
        storage.delete_all(keys).await;
        if let Err(e) = self.repo.delete(application_id).await {
            error!(
                application_id = %application_id,
                error = %e,
                "Failed to remove partially submitted application"
            );
        }
    }

    /// Get an application the caller may see.
    ///
    /// Admins see all; owners see their establishments'; inspectors see
    /// those assigned to them.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Application, ApplicationError> {
        let application = self.load(id).await?;
        self.authorize_view(actor, &application).await?;
        Ok(application)
    }

    /// List applications visible to the caller.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: ApplicationFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Application>, ApplicationError> {
        match actor.role {
            Role::Admin => {}
            Role::Owner => filter.owner_id = Some(actor.user_id),
            Role::Inspector => filter.inspector_id = Some(actor.user_id),
        }

        let page = page.normalized();
        let (items, total) = self.repo.list(filter, page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    /// Documents of an application the caller may see.
    pub async fn documents(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationDocument>, ApplicationError> {
        self.get(actor, application_id).await?;
        self.repo.list_documents(application_id).await
    }

    /// Fetch an application together with its documents, authorizing once.
    pub async fn get_with_documents(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<ApplicationWithDocuments, ApplicationError> {
        let application = self.get(actor, id).await?;
        let documents = self.repo.list_documents(application.id).await?;
        Ok(ApplicationWithDocuments {
            application,
            documents,
        })
    }

    /// Inspection checklists of an application the caller may see.
    pub async fn checklists(
        &self,
        actor: &Actor,
        application_id: Uuid,
    ) -> Result<Vec<InspectionChecklist>, ApplicationError> {
        self.get(actor, application_id).await?;
        self.repo.list_checklists(application_id).await
    }

    /// Download a document, presigned when the provider supports it.
    pub async fn download(
        &self,
        actor: &Actor,
        document_id: Uuid,
    ) -> Result<DocumentDownload, ApplicationError> {
        let storage = self.storage()?;
        let document = self
            .repo
            .find_document(document_id)
            .await?
            .ok_or(ApplicationError::DocumentNotFound(document_id))?;
        self.get(actor, document.application_id).await?;

        match storage.presign_download(&document.storage_key).await {
            Ok(url) => Ok(DocumentDownload::Presigned(url)),
            Err(StorageError::PresignNotSupported) => {
                let data = storage.read(&document.storage_key).await?;
                Ok(DocumentDownload::Inline { document, data })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Assign an inspector and slot. Allowed again while `for_inspection`.
    pub async fn schedule(
        &self,
        actor: &Actor,
        id: Uuid,
        input: ScheduleInput,
    ) -> Result<Application, ApplicationError> {
        actor.require(Role::Admin)?;
        let application = self.load(id).await?;

        let new_status = ApplicationWorkflow::transition(
            application.certificate_type,
            application.status,
            ApplicationAction::Schedule,
        )?;
        validate_inspection_date(input.inspection_date)?;
        self.require_inspector(input.inspector_id).await?;

        let updated = self
            .apply(ApplicationTransition {
                id,
                expected: application.status,
                new_status,
                update: ApplicationUpdate::Schedule {
                    inspector_id: input.inspector_id,
                    inspection_date: input.inspection_date,
                    inspection_time: input.inspection_time,
                    priority: input.priority,
                },
            })
            .await?;

        info!(
            application_id = %id,
            inspector_id = %input.inspector_id,
            inspection_date = %input.inspection_date,
            "Inspection scheduled"
        );
        Ok(updated)
    }

    /// Send an inspected application back for another visit.
    pub async fn reinspect(
        &self,
        actor: &Actor,
        id: Uuid,
        input: ReinspectInput,
    ) -> Result<Application, ApplicationError> {
        actor.require(Role::Admin)?;
        let application = self.load(id).await?;

        let new_status = ApplicationWorkflow::reinspect(
            application.certificate_type,
            application.status,
            &input.reason,
        )?;
        validate_inspection_date(input.inspection_date)?;
        self.require_inspector(input.inspector_id).await?;

        let updated = self
            .apply(ApplicationTransition {
                id,
                expected: application.status,
                new_status,
                update: ApplicationUpdate::Reinspect {
                    inspector_id: input.inspector_id,
                    inspection_date: input.inspection_date,
                    inspection_time: input.inspection_time,
                    reason: input.reason.trim().to_string(),
                },
            })
            .await?;

        info!(application_id = %id, inspector_id = %input.inspector_id, "Reinspection ordered");
        Ok(updated)
    }

    /// Approve or reject an application.
    pub async fn decide(
        &self,
        actor: &Actor,
        id: Uuid,
        input: DecisionInput,
    ) -> Result<Application, ApplicationError> {
        actor.require(Role::Admin)?;
        let application = self.load(id).await?;

        let new_status = ApplicationWorkflow::decide(
            application.certificate_type,
            application.status,
            input.decision,
            input.rejection_reason.as_deref(),
        )?;

        let (rejection_reason, certificate_url) = match input.decision {
            Decision::Approved => (
                None,
                input
                    .certificate_url
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty()),
            ),
            Decision::Rejected => (input.rejection_reason, None),
        };

        let updated = self
            .apply(ApplicationTransition {
                id,
                expected: application.status,
                new_status,
                update: ApplicationUpdate::Decide {
                    decided_by: actor.user_id,
                    decided_at: Utc::now(),
                    rejection_reason,
                    certificate_url,
                },
            })
            .await?;

        info!(application_id = %id, status = %updated.status, "Application decided");
        Ok(updated)
    }

    fn storage(&self) -> Result<&StorageService, ApplicationError> {
        self.storage
            .as_deref()
            .ok_or(ApplicationError::StorageUnavailable)
    }

    async fn load(&self, id: Uuid) -> Result<Application, ApplicationError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::NotFound(id))
    }

    async fn authorize_view(
        &self,
        actor: &Actor,
        application: &Application,
    ) -> Result<(), ApplicationError> {
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Inspector => application.inspector_id == Some(actor.user_id),
            Role::Owner => self
                .repo
                .find_establishment(application.establishment_id)
                .await?
                .is_some_and(|e| e.owner_id == actor.user_id),
        };

        if allowed {
            Ok(())
        } else {
            Err(ApplicationError::Forbidden(
                "you cannot view this application".to_string(),
            ))
        }
    }

    async fn require_inspector(&self, inspector_id: Uuid) -> Result<Profile, ApplicationError> {
        self.repo
            .find_profile(inspector_id)
            .await?
            .filter(Profile::is_assignable_inspector)
            .ok_or(ApplicationError::InvalidInspector(inspector_id))
    }

    async fn apply(&self, change: ApplicationTransition) -> Result<Application, ApplicationError> {
        let (id, from, to) = (change.id, change.expected, change.new_status);
        let updated = self
            .repo
            .transition(change)
            .await?
            .ok_or(WorkflowError::ConcurrentModification)?;
        info!(application_id = %id, from = %from, to = %to, "Application status changed");
        Ok(updated)
    }
}

fn validate_documents(
    storage: &StorageService,
    input: &SubmitApplicationInput,
) -> Result<(), ApplicationError> {
    if input.documents.is_empty() {
        return Err(ApplicationError::Validation(
            "at least one document is required".to_string(),
        ));
    }
    if input.documents.len() > MAX_DOCUMENTS_PER_APPLICATION {
        return Err(ApplicationError::Validation(format!(
            "at most {MAX_DOCUMENTS_PER_APPLICATION} documents may be submitted"
        )));
    }

    for doc in &input.documents {
        let document_type = doc.document_type.trim();
        if document_type.is_empty() {
            return Err(ApplicationError::Validation(format!(
                "document '{}' has no document type",
                doc.filename
            )));
        }
        if document_type.chars().count() > MAX_DOCUMENT_TYPE_LENGTH {
            return Err(ApplicationError::Validation(format!(
                "document type must be at most {MAX_DOCUMENT_TYPE_LENGTH} characters"
            )));
        }
        if doc.filename.chars().count() > MAX_FILE_NAME_LENGTH {
            return Err(ApplicationError::Validation(format!(
                "file name must be at most {MAX_FILE_NAME_LENGTH} characters"
            )));
        }
        storage.validate_upload(&doc.filename, &doc.content_type, doc.data.len() as u64)?;
    }
    Ok(())
}

fn validate_inspection_date(date: chrono::NaiveDate) -> Result<(), ApplicationError> {
    if date < Utc::now().date_naive() {
        return Err(ApplicationError::Validation(
            "inspection date cannot be in the past".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::DocumentUpload;
    use crate::testing::{MemoryStore, memory_storage};
    use crate::workflow::{ApplicationStatus, CertificateType};
    use bytes::Bytes;
    use chrono::{Duration, NaiveTime};

    struct Fixture {
        store: Arc<MemoryStore>,
        storage: Arc<StorageService>,
        service: ApplicationService<MemoryStore>,
        owner: Actor,
        admin: Actor,
        inspector: Actor,
        establishment: Establishment,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let storage = memory_storage();
        let service = ApplicationService::new(store.clone(), Some(storage.clone()));
        let owner = store.add_actor(Role::Owner);
        let admin = store.add_actor(Role::Admin);
        let inspector = store.add_actor(Role::Inspector);
        let establishment = store.add_establishment(owner.user_id, EstablishmentStatus::Registered);
        Fixture {
            store,
            storage,
            service,
            owner,
            admin,
            inspector,
            establishment,
        }
    }

    fn pdf(name: &str) -> DocumentUpload {
        DocumentUpload {
            document_type: "building_plan".to_string(),
            filename: name.to_string(),
            content_type: "application/pdf".to_string(),
            data: Bytes::from_static(b"%PDF-1.7 test"),
        }
    }

    fn submit_input(f: &Fixture, cert: CertificateType) -> SubmitApplicationInput {
        SubmitApplicationInput {
            establishment_id: f.establishment.id,
            certificate_type: cert,
            documents: vec![pdf("plan.pdf")],
        }
    }

    fn schedule_input(inspector: &Actor) -> ScheduleInput {
        ScheduleInput {
            inspector_id: inspector.user_id,
            inspection_date: Utc::now().date_naive() + Duration::days(3),
            inspection_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            priority: true,
        }
    }

    fn approve() -> DecisionInput {
        DecisionInput {
            decision: Decision::Approved,
            rejection_reason: None,
            certificate_url: Some("https://certs.example.gov/123.pdf".to_string()),
        }
    }

    fn reject(reason: Option<&str>) -> DecisionInput {
        DecisionInput {
            decision: Decision::Rejected,
            rejection_reason: reason.map(String::from),
            certificate_url: None,
        }
    }

    #[tokio::test]
    async fn test_submit_fsec_creates_pending_with_document() {
        let f = fixture();
        let result = f
            .service
            .submit(&f.owner, submit_input(&f, CertificateType::Fsec))
            .await
            .unwrap();

        assert_eq!(result.application.status, ApplicationStatus::Pending);
        assert_eq!(result.documents.len(), 1);
        assert_eq!(f.store.application_count(), 1);
        assert_eq!(f.store.document_count(), 1);

        let doc = &result.documents[0];
        assert_eq!(doc.application_id, result.application.id);
        assert_eq!(doc.storage_provider, "memory");
        assert!(f.storage.read(&doc.storage_key).await.is_ok());
    }

    #[tokio::test]
    async fn test_submit_requires_registered_establishment() {
        let f = fixture();
        let pending = f
            .store
            .add_establishment(f.owner.user_id, EstablishmentStatus::Pending);
        let mut input = submit_input(&f, CertificateType::Fsec);
        input.establishment_id = pending.id;

        let err = f.service.submit(&f.owner, input).await.unwrap_err();
        assert_eq!(err.error_code(), "ESTABLISHMENT_NOT_REGISTERED");
        assert_eq!(f.store.application_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_for_foreign_establishment_is_forbidden() {
        let f = fixture();
        let other = f.store.add_actor(Role::Owner);
        let err = f
            .service
            .submit(&other, submit_input(&f, CertificateType::Fsec))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_submit_validates_all_documents_before_writing() {
        let f = fixture();
        let mut input = submit_input(&f, CertificateType::FsicBusiness);
        input.documents.push(DocumentUpload {
            content_type: "application/x-msdownload".to_string(),
            ..pdf("virus.exe")
        });

        let err = f.service.submit(&f.owner, input).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_MIME_TYPE");
        assert_eq!(f.store.application_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_rejects_overlong_labels_before_uploading() {
        let f = fixture();

        let mut input = submit_input(&f, CertificateType::Fsec);
        input.documents[0].document_type = "t".repeat(150);
        let err = f.service.submit(&f.owner, input).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
        assert_eq!(err.status_code(), 400);

        let mut input = submit_input(&f, CertificateType::Fsec);
        input.documents[0].filename = format!("{}.pdf", "n".repeat(300));
        let err = f.service.submit(&f.owner, input).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        assert_eq!(f.store.application_count(), 0);
        assert_eq!(f.store.document_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_requires_documents() {
        let f = fixture();
        let mut input = submit_input(&f, CertificateType::Fsec);
        input.documents.clear();
        let err = f.service.submit(&f.owner, input).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_failure_removes_partial_work() {
        let f = fixture();
        let mut input = submit_input(&f, CertificateType::FsicOccupancy);
        input.documents.push(pdf("permit.pdf"));
        f.store.fail_document_insert_after(1);

        let err = f.service.submit(&f.owner, input).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(f.store.application_count(), 0);
        assert_eq!(f.store.document_count(), 0);
        let keys = f.store.attempted_document_keys();
        assert_eq!(keys.len(), 2);
        for key in keys {
            assert!(f.storage.read(&key).await.is_err(), "{key} should be deleted");
        }
    }

    #[tokio::test]
    async fn test_submit_without_storage_is_unavailable() {
        let f = fixture();
        let service = ApplicationService::new(f.store.clone(), None);
        let err = service
            .submit(&f.owner, submit_input(&f, CertificateType::Fsec))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_schedule_sets_assignment() {
        let f = fixture();
        let app = f
            .store
            .add_application(f.establishment.id, CertificateType::FsicBusiness, ApplicationStatus::Pending);
        let input = schedule_input(&f.inspector);

        let updated = f.service.schedule(&f.admin, app.id, input.clone()).await.unwrap();
        assert_eq!(updated.status, ApplicationStatus::ForInspection);
        assert_eq!(updated.inspector_id, Some(f.inspector.user_id));
        assert_eq!(updated.inspection_date, Some(input.inspection_date));
        assert!(updated.priority);

        // rescheduling keeps the status
        let other = f.store.add_actor(Role::Inspector);
        let rescheduled = f
            .service
            .schedule(&f.admin, app.id, schedule_input(&other))
            .await
            .unwrap();
        assert_eq!(rescheduled.status, ApplicationStatus::ForInspection);
        assert_eq!(rescheduled.inspector_id, Some(other.user_id));
    }

    #[tokio::test]
    async fn test_schedule_rejects_non_inspector_and_fsec() {
        let f = fixture();
        let fsic = f
            .store
            .add_application(f.establishment.id, CertificateType::FsicBusiness, ApplicationStatus::Pending);
        let err = f
            .service
            .schedule(&f.admin, fsic.id, schedule_input(&f.owner))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INSPECTOR");

        let fsec = f
            .store
            .add_application(f.establishment.id, CertificateType::Fsec, ApplicationStatus::Pending);
        let err = f
            .service
            .schedule(&f.admin, fsec.id, schedule_input(&f.inspector))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_schedule_rejects_past_date() {
        let f = fixture();
        let app = f
            .store
            .add_application(f.establishment.id, CertificateType::FsicBusiness, ApplicationStatus::Pending);
        let mut input = schedule_input(&f.inspector);
        input.inspection_date = Utc::now().date_naive() - Duration::days(1);
        let err = f.service.schedule(&f.admin, app.id, input).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_approve_fsec_from_pending() {
        let f = fixture();
        let app = f
            .store
            .add_application(f.establishment.id, CertificateType::Fsec, ApplicationStatus::Pending);

        let updated = f.service.decide(&f.admin, app.id, approve()).await.unwrap();
        assert_eq!(updated.status, ApplicationStatus::Approved);
        assert_eq!(updated.decided_by, Some(f.admin.user_id));
        assert!(updated.decided_at.is_some());
        assert_eq!(
            updated.certificate_url.as_deref(),
            Some("https://certs.example.gov/123.pdf")
        );
    }

    #[tokio::test]
    async fn test_approve_from_wrong_state_writes_nothing() {
        let f = fixture();
        let app = f.store.add_application(
            f.establishment.id,
            CertificateType::FsicOccupancy,
            ApplicationStatus::ForInspection,
        );

        let err = f.service.decide(&f.admin, app.id, approve()).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert_eq!(
            f.store.application(app.id).status,
            ApplicationStatus::ForInspection
        );
    }

    #[tokio::test]
    async fn test_reject_requires_reason_and_stores_it_verbatim() {
        let f = fixture();
        let app = f.store.add_application(
            f.establishment.id,
            CertificateType::FsicBusiness,
            ApplicationStatus::Inspected,
        );

        let err = f.service.decide(&f.admin, app.id, reject(None)).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(f.store.application(app.id).status, ApplicationStatus::Inspected);

        let reason = "  Sprinklers missing on 2F  ";
        let updated = f
            .service
            .decide(&f.admin, app.id, reject(Some(reason)))
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Rejected);
        assert_eq!(updated.rejection_reason.as_deref(), Some(reason));
    }

    #[tokio::test]
    async fn test_double_approve_succeeds_once() {
        let f = fixture();
        let app = f
            .store
            .add_application(f.establishment.id, CertificateType::Fsec, ApplicationStatus::Pending);

        let (first, second) = tokio::join!(
            f.service.decide(&f.admin, app.id, approve()),
            f.service.decide(&f.admin, app.id, approve()),
        );

        let results = [first, second];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            failure.error_code(),
            "CONCURRENT_MODIFICATION" | "INVALID_TRANSITION"
        ));
    }

    #[tokio::test]
    async fn test_lost_compare_and_swap_reports_conflict() {
        let f = fixture();
        let app = f
            .store
            .add_application(f.establishment.id, CertificateType::Fsec, ApplicationStatus::Pending);
        f.store.fail_next_transition();

        let err = f.service.decide(&f.admin, app.id, approve()).await.unwrap_err();
        assert_eq!(err.error_code(), "CONCURRENT_MODIFICATION");
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_reinspect_records_reason() {
        let f = fixture();
        let app = f.store.add_application(
            f.establishment.id,
            CertificateType::FsicOccupancy,
            ApplicationStatus::Inspected,
        );
        let input = ReinspectInput {
            inspector_id: f.inspector.user_id,
            inspection_date: Utc::now().date_naive(),
            inspection_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            reason: "Fire exit was blocked".to_string(),
        };

        let updated = f.service.reinspect(&f.admin, app.id, input).await.unwrap();
        assert_eq!(updated.status, ApplicationStatus::ForInspection);
        assert_eq!(updated.remarks.as_deref(), Some("Fire exit was blocked"));
    }

    #[tokio::test]
    async fn test_visibility_rules() {
        let f = fixture();
        let app = f.store.add_application(
            f.establishment.id,
            CertificateType::FsicBusiness,
            ApplicationStatus::Pending,
        );
        let stranger = f.store.add_actor(Role::Owner);

        assert!(f.service.get(&f.owner, app.id).await.is_ok());
        assert!(f.service.get(&f.admin, app.id).await.is_ok());
        assert_eq!(
            f.service.get(&stranger, app.id).await.unwrap_err().status_code(),
            403
        );
        assert!(f.service.get(&f.inspector, app.id).await.is_err());

        f.service
            .schedule(&f.admin, app.id, schedule_input(&f.inspector))
            .await
            .unwrap();
        assert!(f.service.get(&f.inspector, app.id).await.is_ok());

        let listed = f
            .service
            .list(&stranger, ApplicationFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(listed.meta.total, 0);
    }

    #[tokio::test]
    async fn test_get_with_documents_returns_uploads() {
        let f = fixture();
        let submitted = f
            .service
            .submit(&f.owner, submit_input(&f, CertificateType::Fsec))
            .await
            .unwrap();
        let id = submitted.application.id;

        let found = f.service.get_with_documents(&f.owner, id).await.unwrap();
        assert_eq!(found.application.id, id);
        assert_eq!(found.documents.len(), 1);
        assert_eq!(found.documents[0].file_name, "plan.pdf");

        let stranger = f.store.add_actor(Role::Owner);
        let err = f
            .service
            .get_with_documents(&stranger, id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_download_falls_back_to_inline_bytes() {
        let f = fixture();
        let submitted = f
            .service
            .submit(&f.owner, submit_input(&f, CertificateType::Fsec))
            .await
            .unwrap();
        let doc_id = submitted.documents[0].id;

        match f.service.download(&f.owner, doc_id).await.unwrap() {
            DocumentDownload::Inline { document, data } => {
                assert_eq!(document.file_name, "plan.pdf");
                assert_eq!(data, Bytes::from_static(b"%PDF-1.7 test"));
            }
            DocumentDownload::Presigned(_) => panic!("memory storage cannot presign"),
        }

        let stranger = f.store.add_actor(Role::Owner);
        assert!(f.service.download(&stranger, doc_id).await.is_err());
    }
}
