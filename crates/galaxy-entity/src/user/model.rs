//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered account.
///
/// The credential (`password_hash`, `password_salt`) is replaced as a pair
/// on password change and never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique, lowercased email address.
    pub email: String,
    /// Hex-encoded Argon2id output.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Hex-encoded per-user salt.
    #[serde(skip_serializing)]
    pub password_salt: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Role embedded in access tokens.
    pub role: UserRole,
    /// Consecutive failed login attempts.
    pub failed_login_attempts: i32,
    /// Account locked until this time (if locked).
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is locked at `now`.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Lowercased email.
    pub email: String,
    /// Hex-encoded hash.
    pub password_hash: String,
    /// Hex-encoded salt.
    pub password_salt: String,
    /// Display name (optional).
    pub display_name: Option<String>,
    /// Assigned role.
    pub role: UserRole,
}

impl CreateUser {
    /// Materialize a full row with fresh id and timestamps.
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: self.email,
            password_hash: self.password_hash,
            password_salt: self.password_salt,
            display_name: self.display_name,
            role: self.role,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> User {
        CreateUser {
            email: "a@x.com".into(),
            password_hash: "00".into(),
            password_salt: "11".into(),
            display_name: None,
            role: UserRole::User,
        }
        .into_user()
    }

    #[test]
    fn test_lock_window() {
        let now = Utc::now();
        let mut user = sample();
        assert!(!user.is_locked_at(now));
        user.locked_until = Some(now + Duration::minutes(15));
        assert!(user.is_locked_at(now));
        assert!(!user.is_locked_at(now + Duration::minutes(16)));
    }

    #[test]
    fn test_credential_not_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("password_salt"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
