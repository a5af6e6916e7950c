//! Session audit row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Audit record of one login session.
///
/// Started on login or registration, touched on each refresh and ended
/// with a reason. It carries no authority; tokens do.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Session identifier (`sid` claim).
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Client address as reported by the HTTP layer.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the session started.
    pub created_at: DateTime<Utc>,
    /// Last refresh.
    pub last_activity: DateTime<Utc>,
    /// When the session ended.
    pub ended_at: Option<DateTime<Utc>>,
    /// Why the session ended.
    pub end_reason: Option<String>,
}

impl SessionRecord {
    /// Start a fresh session row.
    pub fn start(
        id: Uuid,
        user_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            ip_address,
            user_agent,
            created_at: now,
            last_activity: now,
            ended_at: None,
            end_reason: None,
        }
    }

    /// Check if the session is still open.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Reason stored in `end_reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// Explicit logout.
    Logout,
    /// "Log out everywhere".
    RevokeAll,
    /// Credential replaced.
    PasswordChange,
}

impl SessionEndReason {
    /// Return the reason as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::RevokeAll => "revoke_all",
            Self::PasswordChange => "password_change",
        }
    }
}

impl fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
