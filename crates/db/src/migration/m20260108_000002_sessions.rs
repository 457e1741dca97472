//! Login sessions.
//!
//! One row per login. The row holds the hash of the session's current
//! refresh token; access tokens are honoured only while the row is
//! unrevoked and unexpired.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(SESSIONS_SQL)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS sessions CASCADE;")
            .await?;
        Ok(())
    }
}

const SESSIONS_SQL: &str = r"
CREATE TABLE sessions (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    refresh_token_hash CHAR(64) NOT NULL,
    user_agent TEXT,
    ip_address VARCHAR(45),
    expires_at TIMESTAMPTZ NOT NULL,
    revoked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Refresh and logout look sessions up by token
CREATE UNIQUE INDEX idx_sessions_token_hash
    ON sessions(refresh_token_hash) WHERE revoked_at IS NULL;

CREATE INDEX idx_sessions_user ON sessions(user_id);

CREATE TRIGGER trg_sessions_touch
BEFORE UPDATE ON sessions
FOR EACH ROW
EXECUTE FUNCTION touch_updated_at();
";
