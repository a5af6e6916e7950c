//! Refresh-token repository backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use galaxy_core::error::{AppError, ErrorKind};
use galaxy_core::result::AppResult;
use galaxy_entity::token::RefreshTokenRecord;

use crate::repositories::RefreshTokenRepository;

const INSERT_SQL: &str = "INSERT INTO refresh_tokens \
     (jti, user_id, session_id, token_hash, session_started_at, issued_at, expires_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

/// Repository for refresh-token rows.
#[derive(Debug, Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Create a new refresh-token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_insert<'q>(
    record: &'q RefreshTokenRecord,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(INSERT_SQL)
        .bind(record.jti)
        .bind(record.user_id)
        .bind(record.session_id)
        .bind(&record.token_hash)
        .bind(record.session_started_at)
        .bind(record.issued_at)
        .bind(record.expires_at)
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, record: &RefreshTokenRecord) -> AppResult<()> {
        bind_insert(record)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to store refresh token", e)
            })?;
        Ok(())
    }

    async fn find(&self, jti: Uuid, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT * FROM refresh_tokens WHERE jti = $1 AND token_hash = $2",
        )
        .bind(jti)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find refresh token", e))
    }

    async fn rotate(&self, old_jti: Uuid, next: &RefreshTokenRecord) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // The revoked = FALSE guard makes the loser of a concurrent rotate
        // observe zero affected rows once the winner commits.
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = NOW() \
             WHERE jti = $1 AND revoked = FALSE",
        )
        .bind(old_jti)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke refresh token", e)
        })?;

        if revoked.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back rotation", e)
            })?;
            return Err(AppError::refresh_token_invalid(
                "Refresh token not found or revoked",
            ));
        }

        bind_insert(next).execute(&mut *tx).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store rotated token", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rotation", e)
        })?;
        Ok(())
    }

    async fn revoke(&self, jti: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = NOW() \
             WHERE jti = $1 AND revoked = FALSE",
        )
        .bind(jti)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke refresh token", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE, revoked_at = NOW() \
             WHERE user_id = $1 AND revoked = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to revoke user tokens", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM refresh_tokens WHERE revoked = TRUE AND expires_at <= NOW()",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge refresh tokens", e)
        })?;
        Ok(result.rows_affected())
    }
}
