//! `SeaORM` active enums backed by PostgreSQL enum types.

use firecert_core::auth::Role;
use firecert_core::workflow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "inspector")]
    Inspector,
    #[sea_orm(string_value = "owner")]
    Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "establishment_status")]
pub enum EstablishmentStatus {
    #[sea_orm(string_value = "unregistered")]
    Unregistered,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "registered")]
    Registered,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "certificate_type")]
pub enum CertificateType {
    #[sea_orm(string_value = "fsec")]
    Fsec,
    #[sea_orm(string_value = "fsic_occupancy")]
    FsicOccupancy,
    #[sea_orm(string_value = "fsic_business")]
    FsicBusiness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "application_status")]
pub enum ApplicationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "for_inspection")]
    ForInspection,
    #[sea_orm(string_value = "inspected")]
    Inspected,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Inspector => Self::Inspector,
            UserRole::Owner => Self::Owner,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Inspector => Self::Inspector,
            Role::Owner => Self::Owner,
        }
    }
}

impl From<EstablishmentStatus> for workflow::EstablishmentStatus {
    fn from(status: EstablishmentStatus) -> Self {
        match status {
            EstablishmentStatus::Unregistered => Self::Unregistered,
            EstablishmentStatus::Pending => Self::Pending,
            EstablishmentStatus::Registered => Self::Registered,
            EstablishmentStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<workflow::EstablishmentStatus> for EstablishmentStatus {
    fn from(status: workflow::EstablishmentStatus) -> Self {
        match status {
            workflow::EstablishmentStatus::Unregistered => Self::Unregistered,
            workflow::EstablishmentStatus::Pending => Self::Pending,
            workflow::EstablishmentStatus::Registered => Self::Registered,
            workflow::EstablishmentStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<CertificateType> for workflow::CertificateType {
    fn from(cert: CertificateType) -> Self {
        match cert {
            CertificateType::Fsec => Self::Fsec,
            CertificateType::FsicOccupancy => Self::FsicOccupancy,
            CertificateType::FsicBusiness => Self::FsicBusiness,
        }
    }
}

impl From<workflow::CertificateType> for CertificateType {
    fn from(cert: workflow::CertificateType) -> Self {
        match cert {
            workflow::CertificateType::Fsec => Self::Fsec,
            workflow::CertificateType::FsicOccupancy => Self::FsicOccupancy,
            workflow::CertificateType::FsicBusiness => Self::FsicBusiness,
        }
    }
}

impl From<ApplicationStatus> for workflow::ApplicationStatus {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Pending => Self::Pending,
            ApplicationStatus::ForInspection => Self::ForInspection,
            ApplicationStatus::Inspected => Self::Inspected,
            ApplicationStatus::Approved => Self::Approved,
            ApplicationStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<workflow::ApplicationStatus> for ApplicationStatus {
    fn from(status: workflow::ApplicationStatus) -> Self {
        match status {
            workflow::ApplicationStatus::Pending => Self::Pending,
            workflow::ApplicationStatus::ForInspection => Self::ForInspection,
            workflow::ApplicationStatus::Inspected => Self::Inspected,
            workflow::ApplicationStatus::Approved => Self::Approved,
            workflow::ApplicationStatus::Rejected => Self::Rejected,
        }
    }
}
