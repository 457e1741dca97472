//! Establishment repository for database operations.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use tracing::debug;
use uuid::Uuid;

use firecert_core::establishment::{
    Establishment, EstablishmentError, EstablishmentFilter,
    EstablishmentRepository as EstablishmentRepoTrait, EstablishmentTransition, NewEstablishment,
};
use firecert_shared::types::PageRequest;

use crate::entities::{establishments, sea_orm_active_enums::EstablishmentStatus as DbStatus};

/// Establishment repository implementation.
#[derive(Debug, Clone)]
pub struct EstablishmentRepository {
    db: DatabaseConnection,
}

impl EstablishmentRepository {
    /// Create a new establishment repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl EstablishmentRepoTrait for EstablishmentRepository {
    async fn create(&self, input: NewEstablishment) -> Result<Establishment, EstablishmentError> {
        let now = Utc::now().into();
        let dti_cert_no = input.dti_cert_no.clone();
        let active_model = establishments::ActiveModel {
            id: Set(input.id),
            owner_id: Set(input.owner_id),
            name: Set(input.name),
            dti_cert_no: Set(input.dti_cert_no),
            address: Set(None),
            status: Set(DbStatus::Unregistered),
            rejection_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = establishments::Entity::insert(active_model)
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    EstablishmentError::DuplicateDtiNumber(dti_cert_no)
                }
                _ => EstablishmentError::repository(e.to_string()),
            })?;

        Ok(to_domain(model))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Establishment>, EstablishmentError> {
        let model = establishments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EstablishmentError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn list(
        &self,
        filter: EstablishmentFilter,
        page: PageRequest,
    ) -> Result<(Vec<Establishment>, u64), EstablishmentError> {
        let mut query = establishments::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(establishments::Column::Status.eq(DbStatus::from(status)));
        }
        if let Some(owner_id) = filter.owner_id {
            query = query.filter(establishments::Column::OwnerId.eq(owner_id));
        }

        let total = query
            .clone()
            .count(&self.db)
            .await
            .map_err(|e| EstablishmentError::repository(e.to_string()))?;

        let models = query
            .order_by_desc(establishments::Column::CreatedAt)
            .order_by_asc(establishments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(|e| EstablishmentError::repository(e.to_string()))?;

        Ok((models.into_iter().map(to_domain).collect(), total))
    }

    async fn transition(
        &self,
        change: EstablishmentTransition,
    ) -> Result<Option<Establishment>, EstablishmentError> {
        let mut update = establishments::ActiveModel {
            status: Set(change.new_status.into()),
            rejection_reason: Set(change.rejection_reason),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };
        if let Some(address) = change.address {
            update.address = Set(Some(address));
        }

        let updated = establishments::Entity::update_many()
            .set(update)
            .filter(establishments::Column::Id.eq(change.id))
            .filter(establishments::Column::Status.eq(DbStatus::from(change.expected)))
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| EstablishmentError::repository(e.to_string()))?;

        let model = updated.into_iter().next();
        if model.is_none() {
            debug!(
                establishment_id = %change.id,
                expected = change.expected.as_str(),
                "Establishment status changed underneath transition"
            );
        }
        Ok(model.map(to_domain))
    }
}

/// Convert an establishment row to the domain type.
fn to_domain(model: establishments::Model) -> Establishment {
    Establishment {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        dti_cert_no: model.dti_cert_no,
        address: model.address,
        status: model.status.into(),
        rejection_reason: model.rejection_reason,
        created_at: model.created_at.into(),
        updated_at: model.updated_at.into(),
    }
}
