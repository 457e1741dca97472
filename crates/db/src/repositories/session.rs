//! Login sessions backing refresh tokens.
//!
//! Only a SHA-256 hash of the current refresh token is stored. Every refresh
//! swaps that hash; a session whose row is revoked or past `expires_at` no
//! longer authorizes access tokens either.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::sessions;

/// Session repository.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hex SHA-256 of a refresh token.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        format!("{:x}", Sha256::digest(token.as_bytes()))
    }

    /// Opens a session. The ID is chosen by the caller because the tokens
    /// issued for it already carry it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<sessions::Model, DbErr> {
        let now = Utc::now().into();

        sessions::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            refresh_token_hash: Set(Self::hash_token(refresh_token)),
            user_agent: Set(user_agent.map(String::from)),
            ip_address: Set(ip_address.map(String::from)),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Unrevoked session whose current refresh token is `refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<sessions::Model>, DbErr> {
        sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(Self::hash_token(refresh_token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .one(&self.db)
            .await
    }

    /// Session by ID, if neither revoked nor expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, id: Uuid) -> Result<Option<sessions::Model>, DbErr> {
        sessions::Entity::find_by_id(id)
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
    }

    /// Swaps `current` for `next` as the session's refresh token.
    ///
    /// Returns `false` when `current` is no longer the session's token or the
    /// session was revoked, so of two refreshes racing with one token only
    /// the first succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn rotate(
        &self,
        id: Uuid,
        current: &str,
        next: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let result = sessions::Entity::update_many()
            .col_expr(
                sessions::Column::RefreshTokenHash,
                Expr::value(Self::hash_token(next)),
            )
            .col_expr(sessions::Column::ExpiresAt, Expr::value(expires_at))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::RefreshTokenHash.eq(Self::hash_token(current)))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Revokes a session. Returns `false` if it was already revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, id: Uuid) -> Result<bool, DbErr> {
        let now = Utc::now();
        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(now))
            .col_expr(sessions::Column::UpdatedAt, Expr::value(now))
            .filter(sessions::Column::Id.eq(id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Revokes the session currently holding `refresh_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> Result<bool, DbErr> {
        match self.find_by_token(refresh_token).await? {
            Some(session) => self.revoke(session.id).await,
            None => Ok(false),
        }
    }
}
