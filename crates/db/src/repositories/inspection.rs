//! Inspection repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use firecert_core::application::Application;
use firecert_core::auth::Profile;
use firecert_core::inspection::{
    AssignmentRow, InspectionChecklist, InspectionError,
    InspectionRepository as InspectionRepoTrait, NewChecklist,
};
use firecert_core::workflow::ApplicationStatus;

use super::application::to_application;
use super::profile::to_profile;
use crate::entities::{
    applications, establishments, inspection_checklists, profiles,
    sea_orm_active_enums::{
        ApplicationStatus as DbApplicationStatus, CertificateType as DbCertificateType,
    },
};

/// Inspection repository implementation.
#[derive(Debug, Clone)]
pub struct InspectionRepository {
    db: DatabaseConnection,
}

impl InspectionRepository {
    /// Create a new inspection repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl InspectionRepoTrait for InspectionRepository {
    async fn find_application(&self, id: Uuid) -> Result<Option<Application>, InspectionError> {
        let model = applications::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        Ok(model.map(to_application))
    }

    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, InspectionError> {
        let model = profiles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        Ok(model.map(to_profile))
    }

    async fn find_profiles(&self, ids: Vec<Uuid>) -> Result<Vec<Profile>, InspectionError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        Ok(models.into_iter().map(to_profile).collect())
    }

    async fn record_inspection(
        &self,
        checklist: NewChecklist,
    ) -> Result<Option<InspectionChecklist>, InspectionError> {
        let checklist_data = serde_json::to_value(&checklist.checklist_data)
            .map_err(|e| InspectionError::repository(e.to_string()))?;
        let images = serde_json::to_value(&checklist.images)
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;
        let now = Utc::now().into();

        // Only the assigned inspector, and only while still for_inspection.
        let moved = applications::Entity::update_many()
            .set(applications::ActiveModel {
                status: Set(DbApplicationStatus::Inspected),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(applications::Column::Id.eq(checklist.application_id))
            .filter(applications::Column::Status.eq(DbApplicationStatus::ForInspection))
            .filter(applications::Column::InspectorId.eq(checklist.inspector_id))
            .exec(&txn)
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        if moved.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| InspectionError::repository(e.to_string()))?;
            debug!(
                application_id = %checklist.application_id,
                "Application left for_inspection before the checklist was written"
            );
            return Ok(None);
        }

        let model = inspection_checklists::ActiveModel {
            id: Set(checklist.id),
            application_id: Set(checklist.application_id),
            certificate_type: Set(checklist.certificate_type.into()),
            inspector_id: Set(checklist.inspector_id),
            inspector_name: Set(checklist.inspector_name),
            checklist_data: Set(checklist_data),
            images: Set(images),
            inspection_date: Set(checklist.inspection_date),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| InspectionError::repository(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        to_checklist(model).map(Some).map_err(InspectionError::repository)
    }

    async fn list_assignments(
        &self,
        inspector_id: Uuid,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<AssignmentRow>, InspectionError> {
        let mut query = applications::Entity::find()
            .filter(applications::Column::InspectorId.eq(inspector_id))
            .filter(applications::Column::CertificateType.ne(DbCertificateType::Fsec));
        if let Some(status) = status {
            query = query.filter(applications::Column::Status.eq(DbApplicationStatus::from(status)));
        }

        let rows = query
            .find_also_related(establishments::Entity)
            .order_by_asc(applications::Column::InspectionDate)
            .all(&self.db)
            .await
            .map_err(|e| InspectionError::repository(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(application, establishment)| {
                let establishment = establishment?;
                Some(AssignmentRow {
                    application: to_application(application),
                    establishment_name: establishment.name,
                    owner_id: establishment.owner_id,
                })
            })
            .collect())
    }
}

/// Convert a checklist row to the domain type.
pub(crate) fn to_checklist(
    model: inspection_checklists::Model,
) -> Result<InspectionChecklist, String> {
    let checklist_data = serde_json::from_value(model.checklist_data)
        .map_err(|e| format!("malformed checklist_data on {}: {e}", model.id))?;
    let images = serde_json::from_value(model.images)
        .map_err(|e| format!("malformed images on {}: {e}", model.id))?;

    Ok(InspectionChecklist {
        id: model.id,
        application_id: model.application_id,
        certificate_type: model.certificate_type.into(),
        inspector_id: model.inspector_id,
        inspector_name: model.inspector_name,
        checklist_data,
        images,
        inspection_date: model.inspection_date,
        created_at: model.created_at.into(),
    })
}
