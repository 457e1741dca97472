//! Application repository for database operations.
//!
//! Status changes are compare-and-swap updates on the `status` column.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::debug;
use uuid::Uuid;

use firecert_core::application::{
    Application, ApplicationDocument, ApplicationError, ApplicationFilter,
    ApplicationRepository as ApplicationRepoTrait, ApplicationTransition, ApplicationUpdate,
    NewApplication, NewDocument,
};
use firecert_core::auth::Profile;
use firecert_core::establishment::Establishment;
use firecert_core::inspection::InspectionChecklist;
use firecert_shared::types::PageRequest;

use super::inspection::to_checklist;
use super::profile::to_profile;
use crate::entities::{
    application_documents, applications, establishments, inspection_checklists, profiles,
    sea_orm_active_enums::{
        ApplicationStatus as DbApplicationStatus, CertificateType as DbCertificateType,
    },
};

/// Application repository implementation.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    db: DatabaseConnection,
}

impl ApplicationRepository {
    /// Create a new application repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl ApplicationRepoTrait for ApplicationRepository {
    async fn find_establishment(&self, id: Uuid) -> Result<Option<Establishment>, ApplicationError> {
        let model = establishments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(model.map(|m| Establishment {
            id: m.id,
            owner_id: m.owner_id,
            name: m.name,
            dti_cert_no: m.dti_cert_no,
            address: m.address,
            status: m.status.into(),
            rejection_reason: m.rejection_reason,
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
        }))
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, ApplicationError> {
        let model = profiles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(model.map(to_profile))
    }

    async fn create(&self, input: NewApplication) -> Result<Application, ApplicationError> {
        let now = Utc::now().into();
        let active_model = applications::ActiveModel {
            id: Set(input.id),
            establishment_id: Set(input.establishment_id),
            certificate_type: Set(input.certificate_type.into()),
            status: Set(DbApplicationStatus::Pending),
            applied_at: Set(input.applied_at.into()),
            inspector_id: Set(None),
            inspection_date: Set(None),
            inspection_time: Set(None),
            priority: Set(false),
            rejection_reason: Set(None),
            certificate_url: Set(None),
            remarks: Set(None),
            submitted_by: Set(input.submitted_by),
            decided_by: Set(None),
            decided_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(to_application(model))
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApplicationError> {
        // Document rows go with it (ON DELETE CASCADE).
        applications::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>, ApplicationError> {
        let model = applications::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(model.map(to_application))
    }

    async fn list(
        &self,
        filter: ApplicationFilter,
        page: PageRequest,
    ) -> Result<(Vec<Application>, u64), ApplicationError> {
        let mut query = applications::Entity::find();
        if let Some(cert) = filter.certificate_type {
            query = query
                .filter(applications::Column::CertificateType.eq(DbCertificateType::from(cert)));
        }
        if let Some(status) = filter.status {
            query = query.filter(applications::Column::Status.eq(DbApplicationStatus::from(status)));
        }
        if let Some(establishment_id) = filter.establishment_id {
            query = query.filter(applications::Column::EstablishmentId.eq(establishment_id));
        }
        if let Some(inspector_id) = filter.inspector_id {
            query = query.filter(applications::Column::InspectorId.eq(inspector_id));
        }
        if let Some(owner_id) = filter.owner_id {
            query = query
                .join(JoinType::InnerJoin, applications::Relation::Establishments.def())
                .filter(establishments::Column::OwnerId.eq(owner_id));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        let models = query
            .order_by_desc(applications::Column::AppliedAt)
            .order_by_asc(applications::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok((models.into_iter().map(to_application).collect(), total))
    }

    async fn transition(
        &self,
        change: ApplicationTransition,
    ) -> Result<Option<Application>, ApplicationError> {
        let mut update = applications::ActiveModel {
            status: Set(change.new_status.into()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        match change.update {
            ApplicationUpdate::Schedule {
                inspector_id,
                inspection_date,
                inspection_time,
                priority,
            } => {
                update.inspector_id = Set(Some(inspector_id));
                update.inspection_date = Set(Some(inspection_date));
                update.inspection_time = Set(Some(inspection_time));
                update.priority = Set(priority);
            }
            ApplicationUpdate::Reinspect {
                inspector_id,
                inspection_date,
                inspection_time,
                reason,
            } => {
                update.inspector_id = Set(Some(inspector_id));
                update.inspection_date = Set(Some(inspection_date));
                update.inspection_time = Set(Some(inspection_time));
                update.remarks = Set(Some(reason));
            }
            ApplicationUpdate::Decide {
                decided_by,
                decided_at,
                rejection_reason,
                certificate_url,
            } => {
                update.decided_by = Set(Some(decided_by));
                update.decided_at = Set(Some(decided_at.into()));
                update.rejection_reason = Set(rejection_reason);
                update.certificate_url = Set(certificate_url);
            }
        }

        let updated = applications::Entity::update_many()
            .set(update)
            .filter(applications::Column::Id.eq(change.id))
            .filter(applications::Column::Status.eq(DbApplicationStatus::from(change.expected)))
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        let model = updated.into_iter().next();
        if model.is_none() {
            debug!(
                application_id = %change.id,
                expected = change.expected.as_str(),
                "Application status changed underneath transition"
            );
        }
        Ok(model.map(to_application))
    }

    async fn create_document(
        &self,
        input: NewDocument,
    ) -> Result<ApplicationDocument, ApplicationError> {
        let active_model = application_documents::ActiveModel {
            id: Set(input.id),
            application_id: Set(input.application_id),
            document_type: Set(input.document_type),
            file_name: Set(input.file_name),
            file_size: Set(input.file_size),
            mime_type: Set(input.mime_type),
            storage_provider: Set(input.storage_provider),
            storage_bucket: Set(input.storage_bucket),
            storage_key: Set(input.storage_key),
            uploaded_by: Set(input.uploaded_by),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(to_document(model))
    }

    async fn list_documents(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationDocument>, ApplicationError> {
        let models = application_documents::Entity::find()
            .filter(application_documents::Column::ApplicationId.eq(application_id))
            .order_by_asc(application_documents::Column::CreatedAt)
            .order_by_asc(application_documents::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(models.into_iter().map(to_document).collect())
    }

    async fn find_document(
        &self,
        id: Uuid,
    ) -> Result<Option<ApplicationDocument>, ApplicationError> {
        let model = application_documents::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        Ok(model.map(to_document))
    }

    async fn list_checklists(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<InspectionChecklist>, ApplicationError> {
        let models = inspection_checklists::Entity::find()
            .filter(inspection_checklists::Column::ApplicationId.eq(application_id))
            .order_by_asc(inspection_checklists::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| ApplicationError::repository(e.to_string()))?;

        models
            .into_iter()
            .map(|m| to_checklist(m).map_err(ApplicationError::repository))
            .collect()
    }
}

/// Convert an application row to the domain type.
pub(crate) fn to_application(model: applications::Model) -> Application {
    Application {
        id: model.id,
        establishment_id: model.establishment_id,
        certificate_type: model.certificate_type.into(),
        status: model.status.into(),
        applied_at: model.applied_at.into(),
        inspector_id: model.inspector_id,
        inspection_date: model.inspection_date,
        inspection_time: model.inspection_time,
        priority: model.priority,
        rejection_reason: model.rejection_reason,
        certificate_url: model.certificate_url,
        remarks: model.remarks,
        submitted_by: model.submitted_by,
        decided_by: model.decided_by,
        decided_at: model.decided_at.map(Into::into),
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    }
}

fn to_document(model: application_documents::Model) -> ApplicationDocument {
    ApplicationDocument {
        id: model.id,
        application_id: model.application_id,
        document_type: model.document_type,
        file_name: model.file_name,
        file_size: model.file_size,
        mime_type: model.mime_type,
        storage_provider: model.storage_provider,
        storage_bucket: model.storage_bucket,
        storage_key: model.storage_key,
        uploaded_by: model.uploaded_by,
        created_at: model.created_at.into(),
    }
}
