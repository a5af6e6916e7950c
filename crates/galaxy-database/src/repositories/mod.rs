//! Repository traits and their Postgres and in-memory implementations.
//!
//! The auth layer depends only on these traits. Backends are chosen at
//! startup by [`crate::provider::Repositories`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use galaxy_core::result::AppResult;
use galaxy_entity::session::{SessionEndReason, SessionRecord};
use galaxy_entity::token::RefreshTokenRecord;
use galaxy_entity::user::{CreateUser, User};

/// Outcome of recording a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedLogin {
    /// Consecutive failures including this one.
    pub attempts: i32,
    /// Set when this failure crossed the lockout threshold.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Account storage.
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug {
    /// Insert a new user. Fails with `Conflict` if the email is taken.
    async fn create(&self, data: CreateUser) -> AppResult<User>;

    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Count one more failed login, locking the account once `max_attempts`
    /// is reached. A lock that already lapsed restarts the count at one.
    async fn record_failed_login(
        &self,
        user_id: Uuid,
        max_attempts: i32,
        lockout: Duration,
    ) -> AppResult<FailedLogin>;

    /// Clear the failure counter and lock, and stamp `last_login_at`.
    async fn record_successful_login(&self, user_id: Uuid) -> AppResult<()>;

    /// Replace the credential pair wholesale.
    async fn update_credential(
        &self,
        user_id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> AppResult<()>;
}

/// Refresh-token row storage.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync + std::fmt::Debug {
    /// Persist a newly issued refresh token.
    async fn insert(&self, record: &RefreshTokenRecord) -> AppResult<()>;

    /// Find the row with this `jti` whose hash matches.
    async fn find(&self, jti: Uuid, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>>;

    /// Revoke `old_jti` and insert `next` as one atomic step.
    ///
    /// Fails with `RefreshTokenInvalid` and persists nothing if `old_jti`
    /// was already revoked or does not exist. Of two concurrent calls on
    /// the same `old_jti`, exactly one succeeds.
    async fn rotate(&self, old_jti: Uuid, next: &RefreshTokenRecord) -> AppResult<()>;

    /// Revoke one row. Returns whether a live row was revoked.
    async fn revoke(&self, jti: Uuid) -> AppResult<bool>;

    /// Revoke every live row of a user. Returns the number revoked.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Delete rows that are both expired and revoked.
    async fn purge_expired(&self) -> AppResult<u64>;
}

/// Session audit storage.
#[async_trait]
pub trait SessionRepository: Send + Sync + std::fmt::Debug {
    /// Record the start of a session.
    async fn start(&self, record: &SessionRecord) -> AppResult<()>;

    /// Find a session row.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SessionRecord>>;

    /// Every session of a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<SessionRecord>>;

    /// Bump `last_activity`.
    async fn touch(&self, id: Uuid) -> AppResult<()>;

    /// End one open session. Returns whether a row changed.
    async fn end(&self, id: Uuid, reason: SessionEndReason) -> AppResult<bool>;

    /// End every open session of a user.
    async fn end_all_for_user(&self, user_id: Uuid, reason: SessionEndReason) -> AppResult<u64>;
}
