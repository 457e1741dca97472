//! `SeaORM` entities, one module per table.

pub mod application_documents;
pub mod applications;
pub mod establishments;
pub mod inspection_checklists;
pub mod profiles;
pub mod sea_orm_active_enums;
pub mod sessions;
