//! User repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use galaxy_core::error::{AppError, ErrorKind};
use galaxy_core::result::AppResult;
use galaxy_entity::user::{CreateUser, User};

use crate::repositories::{FailedLogin, UserRepository};

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, data: CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, password_salt, display_name, role) \
             VALUES (LOWER($1), $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.password_salt)
        .bind(&data.display_name)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::conflict("Email already registered")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn record_failed_login(
        &self,
        user_id: Uuid,
        max_attempts: i32,
        lockout: Duration,
    ) -> AppResult<FailedLogin> {
        // SET expressions all see the pre-update row.
        let row: (i32, Option<DateTime<Utc>>) = sqlx::query_as(
            "UPDATE users SET \
                 failed_login_attempts = CASE \
                     WHEN locked_until IS NOT NULL AND locked_until <= NOW() THEN 1 \
                     ELSE failed_login_attempts + 1 END, \
                 locked_until = CASE \
                     WHEN (CASE WHEN locked_until IS NOT NULL AND locked_until <= NOW() THEN 1 \
                                ELSE failed_login_attempts + 1 END) >= $2 \
                         THEN NOW() + make_interval(secs => $3) \
                     WHEN locked_until IS NOT NULL AND locked_until <= NOW() THEN NULL \
                     ELSE locked_until END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING failed_login_attempts, locked_until",
        )
        .bind(user_id)
        .bind(max_attempts)
        .bind(lockout.num_seconds() as f64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record failed login", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;

        let locked_until = if row.0 >= max_attempts { row.1 } else { None };
        Ok(FailedLogin {
            attempts: row.0,
            locked_until,
        })
    }

    async fn record_successful_login(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, \
                              last_login_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record successful login", e)
        })?;
        Ok(())
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, password_salt = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .bind(password_salt)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(())
    }
}
