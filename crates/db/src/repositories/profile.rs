//! Profile repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use firecert_core::auth::{Profile, Role};

use crate::entities::{profiles, sea_orm_active_enums::UserRole};

/// Error types for profile operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Another profile already uses the email.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Fields of a new profile. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewProfile {
    /// Login email, stored lowercase.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// First name.
    pub first_name: String,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Last name.
    pub last_name: String,
    /// Role, fixed for the life of the profile.
    pub role: Role,
    /// Inspector rank code.
    pub position: Option<String>,
}

/// Profile repository for account operations.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    db: DatabaseConnection,
}

impl ProfileRepository {
    /// Creates a new profile repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a profile by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<profiles::Model>, DbErr> {
        profiles::Entity::find()
            .filter(profiles::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
    }

    /// Finds a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<profiles::Model>, DbErr> {
        profiles::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = profiles::Entity::find()
            .filter(profiles::Column::Email.eq(email.trim().to_lowercase()))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new profile.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEmail` if the email is taken, or a database error.
    pub async fn create(&self, input: NewProfile) -> Result<profiles::Model, ProfileError> {
        let email = input.email.trim().to_lowercase();
        let now = chrono::Utc::now().into();
        let profile = profiles::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.clone()),
            password_hash: Set(input.password_hash),
            first_name: Set(input.first_name.trim().to_string()),
            middle_name: Set(input
                .middle_name
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())),
            last_name: Set(input.last_name.trim().to_string()),
            role: Set(input.role.into()),
            position: Set(input.position),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        profile.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ProfileError::DuplicateEmail(email),
            _ => ProfileError::Database(e),
        })
    }

    /// Deletes a profile. Used to undo a signup whose follow-up step failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = profiles::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Lists inspector profiles, active ones first, by last name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_inspectors(&self) -> Result<Vec<profiles::Model>, DbErr> {
        profiles::Entity::find()
            .filter(profiles::Column::Role.eq(UserRole::Inspector))
            .order_by_desc(profiles::Column::IsActive)
            .order_by_asc(profiles::Column::LastName)
            .order_by_asc(profiles::Column::FirstName)
            .all(&self.db)
            .await
    }
}

/// Convert a profile row to the domain profile.
#[must_use]
pub fn to_profile(model: profiles::Model) -> Profile {
    Profile {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        middle_name: model.middle_name,
        last_name: model.last_name,
        role: model.role.into(),
        position: model.position,
        is_active: model.is_active,
    }
}
