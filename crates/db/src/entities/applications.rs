//! `SeaORM` Entity for applications table.
//!
//! One table holds all three certificate types, discriminated by
//! `certificate_type`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ApplicationStatus, CertificateType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub certificate_type: CertificateType,
    pub status: ApplicationStatus,
    pub applied_at: DateTimeWithTimeZone,
    pub inspector_id: Option<Uuid>,
    pub inspection_date: Option<Date>,
    pub inspection_time: Option<Time>,
    pub priority: bool,
    pub rejection_reason: Option<String>,
    pub certificate_url: Option<String>,
    pub remarks: Option<String>,
    pub submitted_by: Uuid,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::establishments::Entity",
        from = "Column::EstablishmentId",
        to = "super::establishments::Column::Id"
    )]
    Establishments,
    #[sea_orm(has_many = "super::application_documents::Entity")]
    ApplicationDocuments,
    #[sea_orm(has_many = "super::inspection_checklists::Entity")]
    InspectionChecklists,
}

impl Related<super::establishments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Establishments.def()
    }
}

impl Related<super::application_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApplicationDocuments.def()
    }
}

impl Related<super::inspection_checklists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InspectionChecklists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
