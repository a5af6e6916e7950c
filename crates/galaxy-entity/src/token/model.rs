//! Refresh token row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One link of a refresh-token chain.
///
/// Only the SHA-256 of the token is stored. Once `revoked` is set it is
/// never cleared.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// Token identifier (`jti` claim).
    pub jti: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Session this chain belongs to (`sid` claim).
    pub session_id: Uuid,
    /// Hex SHA-256 of the encoded token.
    pub token_hash: String,
    /// Issue time of the first token in the chain.
    pub session_started_at: DateTime<Utc>,
    /// Issue time of this token.
    pub issued_at: DateTime<Utc>,
    /// Expiry of this token.
    pub expires_at: DateTime<Utc>,
    /// Whether the row has been revoked.
    pub revoked: bool,
    /// When the row was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Check whether the row is past its own expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the purge job may delete this row.
    pub fn is_purgeable_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked && self.is_expired_at(now)
    }
}
