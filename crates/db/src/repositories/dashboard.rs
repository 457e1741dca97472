//! Dashboard repository for status counts.

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect,
    RelationTrait, sea_query::Expr,
};
use uuid::Uuid;

use firecert_core::dashboard::{DashboardRepository as DashboardRepoTrait, DashboardScope};
use firecert_core::workflow::{ApplicationStatus, CertificateType, EstablishmentStatus};
use firecert_shared::AppError;

use crate::entities::{
    applications, establishments,
    sea_orm_active_enums::{
        ApplicationStatus as DbApplicationStatus, CertificateType as DbCertificateType,
        EstablishmentStatus as DbEstablishmentStatus,
    },
};

/// Dashboard repository implementation.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn count_establishments(
        &self,
        owner_id: Option<Uuid>,
    ) -> Result<Vec<(DbEstablishmentStatus, i64)>, DbErr> {
        let mut query = establishments::Entity::find()
            .select_only()
            .column(establishments::Column::Status)
            .column_as(
                Expr::col((establishments::Entity, establishments::Column::Id)).count(),
                "count",
            )
            .group_by(establishments::Column::Status);
        if let Some(owner_id) = owner_id {
            query = query.filter(establishments::Column::OwnerId.eq(owner_id));
        }
        query.into_tuple().all(&self.db).await
    }

    async fn count_applications(
        &self,
        scope: DashboardScope,
    ) -> Result<Vec<(DbCertificateType, DbApplicationStatus, i64)>, DbErr> {
        let mut query = applications::Entity::find()
            .select_only()
            .column(applications::Column::CertificateType)
            .column(applications::Column::Status)
            .column_as(
                Expr::col((applications::Entity, applications::Column::Id)).count(),
                "count",
            )
            .group_by(applications::Column::CertificateType)
            .group_by(applications::Column::Status);
        match scope {
            DashboardScope::All => {}
            DashboardScope::Owner(owner_id) => {
                query = query
                    .join(JoinType::InnerJoin, applications::Relation::Establishments.def())
                    .filter(establishments::Column::OwnerId.eq(owner_id));
            }
            DashboardScope::Inspector(inspector_id) => {
                query = query.filter(applications::Column::InspectorId.eq(inspector_id));
            }
        }
        query.into_tuple().all(&self.db).await
    }
}

impl DashboardRepoTrait for DashboardRepository {
    async fn establishment_counts(
        &self,
        scope: DashboardScope,
    ) -> Result<Vec<(EstablishmentStatus, u64)>, AppError> {
        let owner_id = match scope {
            DashboardScope::All => None,
            DashboardScope::Owner(owner_id) => Some(owner_id),
            DashboardScope::Inspector(_) => return Ok(Vec::new()),
        };

        let rows = self
            .count_establishments(owner_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| (status.into(), count.unsigned_abs()))
            .collect())
    }

    async fn application_counts(
        &self,
        scope: DashboardScope,
    ) -> Result<Vec<(CertificateType, ApplicationStatus, u64)>, AppError> {
        let rows = self
            .count_applications(scope)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(cert, status, count)| (cert.into(), status.into(), count.unsigned_abs()))
            .collect())
    }
}
