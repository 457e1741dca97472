//! In-memory repositories shared by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveTime, Utc};
use firecert_shared::AppError;
use firecert_shared::types::PageRequest;
use uuid::Uuid;

use crate::application::{
    Application, ApplicationDocument, ApplicationError, ApplicationFilter, ApplicationRepository,
    ApplicationTransition, ApplicationUpdate, NewApplication, NewDocument,
};
use crate::auth::{Actor, Profile, Role};
use crate::dashboard::{DashboardRepository, DashboardScope};
use crate::establishment::{
    Establishment, EstablishmentError, EstablishmentFilter, EstablishmentRepository,
    EstablishmentTransition, NewEstablishment,
};
use crate::inspection::{
    AssignmentRow, InspectionChecklist, InspectionError, InspectionRepository, NewChecklist,
};
use crate::storage::{StorageConfig, StorageProvider, StorageService};
use crate::workflow::{ApplicationStatus, CertificateType, EstablishmentStatus};

pub(crate) fn memory_storage() -> Arc<StorageService> {
    Arc::new(
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("memory storage"),
    )
}

#[derive(Default)]
struct State {
    profiles: HashMap<Uuid, Profile>,
    establishments: HashMap<Uuid, Establishment>,
    applications: HashMap<Uuid, Application>,
    documents: Vec<ApplicationDocument>,
    checklists: Vec<InspectionChecklist>,
    attempted_document_keys: Vec<String>,
    document_inserts_before_failure: Option<usize>,
    fail_next_transition: bool,
    next_dti: u32,
}

/// One store backing every repository trait.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store lock")
    }

    pub(crate) fn add_actor(&self, role: Role) -> Actor {
        let id = Uuid::new_v4();
        let last_name = match role {
            Role::Admin => "Admin",
            Role::Inspector => "Inspector",
            Role::Owner => "Owner",
        };
        self.state().profiles.insert(
            id,
            Profile {
                id,
                email: format!("{id}@example.com"),
                first_name: "Test".to_string(),
                middle_name: None,
                last_name: last_name.to_string(),
                role,
                position: (role == Role::Inspector).then(|| "FO1".to_string()),
                is_active: true,
            },
        );
        Actor::new(id, role)
    }

    pub(crate) fn display_name(&self, profile_id: Uuid) -> String {
        self.state().profiles[&profile_id].display_name()
    }

    pub(crate) fn add_establishment(
        &self,
        owner_id: Uuid,
        status: EstablishmentStatus,
    ) -> Establishment {
        let mut state = self.state();
        state.next_dti += 1;
        let now = Utc::now();
        let est = Establishment {
            id: Uuid::new_v4(),
            owner_id,
            name: "Test Establishment".to_string(),
            dti_cert_no: format!("DTI-TEST-{}", state.next_dti),
            address: (status != EstablishmentStatus::Unregistered)
                .then(|| "1 Test Street".to_string()),
            status,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        state.establishments.insert(est.id, est.clone());
        est
    }

    pub(crate) fn establishment(&self, id: Uuid) -> Establishment {
        self.state().establishments[&id].clone()
    }

    pub(crate) fn establishment_owner(&self, id: Uuid) -> Uuid {
        self.state().establishments[&id].owner_id
    }

    pub(crate) fn add_application(
        &self,
        establishment_id: Uuid,
        certificate_type: CertificateType,
        status: ApplicationStatus,
    ) -> Application {
        let now = Utc::now();
        let owner_id = self.establishment_owner(establishment_id);
        let app = Application {
            id: Uuid::new_v4(),
            establishment_id,
            certificate_type,
            status,
            applied_at: now,
            inspector_id: None,
            inspection_date: None,
            inspection_time: None,
            priority: false,
            rejection_reason: None,
            certificate_url: None,
            remarks: None,
            submitted_by: owner_id,
            decided_by: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state().applications.insert(app.id, app.clone());
        app
    }

    pub(crate) fn assign(
        &self,
        application_id: Uuid,
        inspector_id: Uuid,
        date: Option<NaiveDate>,
        priority: bool,
    ) {
        let mut state = self.state();
        let app = state
            .applications
            .get_mut(&application_id)
            .expect("application exists");
        app.inspector_id = Some(inspector_id);
        app.inspection_date = date;
        app.inspection_time = date.and_then(|_| NaiveTime::from_hms_opt(9, 0, 0));
        app.priority = priority;
    }

    pub(crate) fn application(&self, id: Uuid) -> Application {
        self.state().applications[&id].clone()
    }

    pub(crate) fn application_count(&self) -> usize {
        self.state().applications.len()
    }

    pub(crate) fn document_count(&self) -> usize {
        self.state().documents.len()
    }

    pub(crate) fn checklist_count(&self) -> usize {
        self.state().checklists.len()
    }

    /// Storage keys of every document insert attempted, including failed ones.
    pub(crate) fn attempted_document_keys(&self) -> Vec<String> {
        self.state().attempted_document_keys.clone()
    }

    /// Let `n` document inserts succeed, then fail the next one.
    pub(crate) fn fail_document_insert_after(&self, n: usize) {
        self.state().document_inserts_before_failure = Some(n);
    }

    /// Make the next status write behave as if another request got there first.
    pub(crate) fn fail_next_transition(&self) {
        self.state().fail_next_transition = true;
    }

    fn take_transition_failure(state: &mut State) -> bool {
        std::mem::take(&mut state.fail_next_transition)
    }
}

impl EstablishmentRepository for MemoryStore {
    async fn create(&self, input: NewEstablishment) -> Result<Establishment, EstablishmentError> {
        let mut state = self.state();
        if state
            .establishments
            .values()
            .any(|e| e.dti_cert_no == input.dti_cert_no)
        {
            return Err(EstablishmentError::DuplicateDtiNumber(input.dti_cert_no));
        }
        let now = Utc::now();
        let est = Establishment {
            id: input.id,
            owner_id: input.owner_id,
            name: input.name,
            dti_cert_no: input.dti_cert_no,
            address: None,
            status: EstablishmentStatus::Unregistered,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };
        state.establishments.insert(est.id, est.clone());
        Ok(est)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Establishment>, EstablishmentError> {
        Ok(self.state().establishments.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: EstablishmentFilter,
        page: PageRequest,
    ) -> Result<(Vec<Establishment>, u64), EstablishmentError> {
        let state = self.state();
        let mut items: Vec<Establishment> = state
            .establishments
            .values()
            .filter(|e| filter.status.is_none_or(|s| e.status == s))
            .filter(|e| filter.owner_id.is_none_or(|o| e.owner_id == o))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = items.len() as u64;
        let items = paginate(items, page);
        Ok((items, total))
    }

    async fn transition(
        &self,
        change: EstablishmentTransition,
    ) -> Result<Option<Establishment>, EstablishmentError> {
        let mut state = self.state();
        if Self::take_transition_failure(&mut state) {
            return Ok(None);
        }
        let Some(est) = state.establishments.get_mut(&change.id) else {
            return Ok(None);
        };
        if est.status != change.expected {
            return Ok(None);
        }
        est.status = change.new_status;
        if let Some(address) = change.address {
            est.address = Some(address);
        }
        est.rejection_reason = change.rejection_reason;
        est.updated_at = Utc::now();
        Ok(Some(est.clone()))
    }
}

impl ApplicationRepository for MemoryStore {
    async fn find_establishment(&self, id: Uuid) -> Result<Option<Establishment>, ApplicationError> {
        Ok(self.state().establishments.get(&id).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, ApplicationError> {
        Ok(self.state().profiles.get(&id).cloned())
    }

    async fn create(&self, input: NewApplication) -> Result<Application, ApplicationError> {
        let now = Utc::now();
        let app = Application {
            id: input.id,
            establishment_id: input.establishment_id,
            certificate_type: input.certificate_type,
            status: ApplicationStatus::Pending,
            applied_at: input.applied_at,
            inspector_id: None,
            inspection_date: None,
            inspection_time: None,
            priority: false,
            rejection_reason: None,
            certificate_url: None,
            remarks: None,
            submitted_by: input.submitted_by,
            decided_by: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state().applications.insert(app.id, app.clone());
        Ok(app)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApplicationError> {
        let mut state = self.state();
        state.applications.remove(&id);
        state.documents.retain(|d| d.application_id != id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>, ApplicationError> {
        Ok(self.state().applications.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: ApplicationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Application>, u64), ApplicationError> {
        let state = self.state();
        let mut items: Vec<Application> = state
            .applications
            .values()
            .filter(|a| filter.certificate_type.is_none_or(|c| a.certificate_type == c))
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .filter(|a| filter.establishment_id.is_none_or(|e| a.establishment_id == e))
            .filter(|a| filter.inspector_id.is_none_or(|i| a.inspector_id == Some(i)))
            .filter(|a| {
                filter.owner_id.is_none_or(|o| {
                    state
                        .establishments
                        .get(&a.establishment_id)
                        .is_some_and(|e| e.owner_id == o)
                })
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        let total = items.len() as u64;
        Ok((paginate(items, page), total))
    }

    async fn transition(
        &self,
        change: ApplicationTransition,
    ) -> Result<Option<Application>, ApplicationError> {
        let mut state = self.state();
        if Self::take_transition_failure(&mut state) {
            return Ok(None);
        }
        let Some(app) = state.applications.get_mut(&change.id) else {
            return Ok(None);
        };
        if app.status != change.expected {
            return Ok(None);
        }
        app.status = change.new_status;
        match change.update {
            ApplicationUpdate::Schedule {
                inspector_id,
                inspection_date,
                inspection_time,
                priority,
            } => {
                app.inspector_id = Some(inspector_id);
                app.inspection_date = Some(inspection_date);
                app.inspection_time = Some(inspection_time);
                app.priority = priority;
            }
            ApplicationUpdate::Reinspect {
                inspector_id,
                inspection_date,
                inspection_time,
                reason,
            } => {
                app.inspector_id = Some(inspector_id);
                app.inspection_date = Some(inspection_date);
                app.inspection_time = Some(inspection_time);
                app.remarks = Some(reason);
            }
            ApplicationUpdate::Decide {
                decided_by,
                decided_at,
                rejection_reason,
                certificate_url,
            } => {
                app.decided_by = Some(decided_by);
                app.decided_at = Some(decided_at);
                app.rejection_reason = rejection_reason;
                app.certificate_url = certificate_url;
            }
        }
        app.updated_at = Utc::now();
        Ok(Some(app.clone()))
    }

    async fn create_document(
        &self,
        input: NewDocument,
    ) -> Result<ApplicationDocument, ApplicationError> {
        let mut state = self.state();
        state.attempted_document_keys.push(input.storage_key.clone());
        if let Some(remaining) = state.document_inserts_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(ApplicationError::repository("injected insert failure"));
            }
            *remaining -= 1;
        }
        let doc = ApplicationDocument {
            id: input.id,
            application_id: input.application_id,
            document_type: input.document_type,
            file_name: input.file_name,
            file_size: input.file_size,
            mime_type: input.mime_type,
            storage_provider: input.storage_provider,
            storage_bucket: input.storage_bucket,
            storage_key: input.storage_key,
            uploaded_by: input.uploaded_by,
            created_at: Utc::now(),
        };
        state.documents.push(doc.clone());
        Ok(doc)
    }

    async fn list_documents(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationDocument>, ApplicationError> {
        Ok(self
            .state()
            .documents
            .iter()
            .filter(|d| d.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn find_document(&self, id: Uuid) -> Result<Option<ApplicationDocument>, ApplicationError> {
        Ok(self.state().documents.iter().find(|d| d.id == id).cloned())
    }

    async fn list_checklists(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<InspectionChecklist>, ApplicationError> {
        Ok(self
            .state()
            .checklists
            .iter()
            .filter(|c| c.application_id == application_id)
            .cloned()
            .collect())
    }
}

impl InspectionRepository for MemoryStore {
    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, InspectionError> {
        Ok(self.state().applications.get(&id).cloned())
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, InspectionError> {
        Ok(self.state().profiles.get(&id).cloned())
    }

    async fn find_profiles(&self, ids: Vec<Uuid>) -> Result<Vec<Profile>, InspectionError> {
        let state = self.state();
        Ok(ids
            .iter()
            .filter_map(|id| state.profiles.get(id).cloned())
            .collect())
    }

    async fn record_inspection(
        &self,
        checklist: NewChecklist,
    ) -> Result<Option<InspectionChecklist>, InspectionError> {
        let mut state = self.state();
        if Self::take_transition_failure(&mut state) {
            return Ok(None);
        }
        let Some(app) = state.applications.get_mut(&checklist.application_id) else {
            return Ok(None);
        };
        if app.status != ApplicationStatus::ForInspection {
            return Ok(None);
        }
        app.status = ApplicationStatus::Inspected;
        app.updated_at = Utc::now();

        let record = InspectionChecklist {
            id: checklist.id,
            application_id: checklist.application_id,
            certificate_type: checklist.certificate_type,
            inspector_id: checklist.inspector_id,
            inspector_name: checklist.inspector_name,
            checklist_data: checklist.checklist_data,
            images: checklist.images,
            inspection_date: checklist.inspection_date,
            created_at: Utc::now(),
        };
        state.checklists.push(record.clone());
        Ok(Some(record))
    }

    async fn list_assignments(
        &self,
        inspector_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<AssignmentRow>, InspectionError> {
        let state = self.state();
        Ok(state
            .applications
            .values()
            .filter(|a| a.inspector_id == Some(inspector_id))
            .filter(|a| status.is_none_or(|s| a.status == s))
            .filter_map(|a| {
                let est = state.establishments.get(&a.establishment_id)?;
                Some(AssignmentRow {
                    application: a.clone(),
                    establishment_name: est.name.clone(),
                    owner_id: est.owner_id,
                })
            })
            .collect())
    }
}

impl DashboardRepository for MemoryStore {
    async fn establishment_counts(
        &self,
        scope: DashboardScope,
    ) -> Result<Vec<(EstablishmentStatus, u64)>, AppError> {
        let state = self.state();
        let mut counts: HashMap<EstablishmentStatus, u64> = HashMap::new();
        for est in state.establishments.values() {
            let in_scope = match scope {
                DashboardScope::All => true,
                DashboardScope::Owner(owner) => est.owner_id == owner,
                DashboardScope::Inspector(_) => false,
            };
            if in_scope {
                *counts.entry(est.status).or_default() += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn application_counts(
        &self,
        scope: DashboardScope,
    ) -> Result<Vec<(CertificateType, ApplicationStatus, u64)>, AppError> {
        let state = self.state();
        let mut counts: HashMap<(CertificateType, ApplicationStatus), u64> = HashMap::new();
        for app in state.applications.values() {
            let in_scope = match scope {
                DashboardScope::All => true,
                DashboardScope::Owner(owner) => state
                    .establishments
                    .get(&app.establishment_id)
                    .is_some_and(|e| e.owner_id == owner),
                DashboardScope::Inspector(inspector) => app.inspector_id == Some(inspector),
            };
            if in_scope {
                *counts.entry((app.certificate_type, app.status)).or_default() += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|((cert, status), count)| (cert, status, count))
            .collect())
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}
