//! Session audit repository backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use galaxy_core::error::{AppError, ErrorKind};
use galaxy_core::result::AppResult;
use galaxy_entity::session::{SessionEndReason, SessionRecord};

use crate::repositories::SessionRepository;

/// Repository for `user_sessions` rows.
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn start(&self, record: &SessionRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_sessions (id, user_id, ip_address, user_agent, created_at, last_activity) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(record.created_at)
        .bind(record.last_activity)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>("SELECT * FROM user_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            "SELECT * FROM user_sessions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list sessions", e))
    }

    async fn touch(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE user_sessions SET last_activity = NOW() WHERE id = $1 AND ended_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to touch session", e))?;
        Ok(())
    }

    async fn end(&self, id: Uuid, reason: SessionEndReason) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE user_sessions SET ended_at = NOW(), end_reason = $2 \
             WHERE id = $1 AND ended_at IS NULL",
        )
        .bind(id)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to end session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn end_all_for_user(&self, user_id: Uuid, reason: SessionEndReason) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE user_sessions SET ended_at = NOW(), end_reason = $2 \
             WHERE user_id = $1 AND ended_at IS NULL",
        )
        .bind(user_id)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to end user sessions", e)
        })?;
        Ok(result.rows_affected())
    }
}
