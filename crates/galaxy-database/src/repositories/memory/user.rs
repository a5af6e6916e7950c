//! In-memory user repository.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;
use galaxy_entity::user::{CreateUser, User};

use crate::repositories::{FailedLogin, UserRepository};

/// User rows keyed by id, plus a unique email index.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: DashMap<Uuid, User>,
    emails: DashMap<String, Uuid>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(user_id: Uuid) -> AppError {
        AppError::not_found(format!("User {user_id} not found"))
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, mut data: CreateUser) -> AppResult<User> {
        data.email = data.email.to_lowercase();
        match self.emails.entry(data.email.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict("Email already registered")),
            Entry::Vacant(slot) => {
                let user = data.into_user();
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let Some(id) = self.emails.get(&email.to_lowercase()).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn record_failed_login(
        &self,
        user_id: Uuid,
        max_attempts: i32,
        lockout: Duration,
    ) -> AppResult<FailedLogin> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::missing(user_id))?;
        let now = Utc::now();

        let lapsed = user.locked_until.is_some_and(|until| until <= now);
        if lapsed {
            user.failed_login_attempts = 1;
            user.locked_until = None;
        } else {
            user.failed_login_attempts += 1;
        }

        let mut locked_until = None;
        if user.failed_login_attempts >= max_attempts {
            let until = now + lockout;
            user.locked_until = Some(until);
            locked_until = Some(until);
        }
        user.updated_at = now;

        Ok(FailedLogin {
            attempts: user.failed_login_attempts,
            locked_until,
        })
    }

    async fn record_successful_login(&self, user_id: Uuid) -> AppResult<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::missing(user_id))?;
        let now = Utc::now();
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.last_login_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        password_hash: &str,
        password_salt: &str,
    ) -> AppResult<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Self::missing(user_id))?;
        user.password_hash = password_hash.to_string();
        user.password_salt = password_salt.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::ErrorKind;
    use galaxy_entity::user::UserRole;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "aa".into(),
            password_salt: "bb".into(),
            display_name: None,
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = MemoryUserRepository::new();
        repo.create(new_user("A@x.com")).await.unwrap();
        let err = repo.create(new_user("a@X.com")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(repo.find_by_email("a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lockout_after_threshold() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("lock@x.com")).await.unwrap();
        let window = Duration::minutes(15);

        for attempt in 1..5 {
            let outcome = repo.record_failed_login(user.id, 5, window).await.unwrap();
            assert_eq!(outcome.attempts, attempt);
            assert!(outcome.locked_until.is_none());
        }
        let outcome = repo.record_failed_login(user.id, 5, window).await.unwrap();
        assert_eq!(outcome.attempts, 5);
        assert!(outcome.locked_until.is_some());

        repo.record_successful_login(user.id).await.unwrap();
        let user = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.locked_until.is_none());
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_lapsed_lock_restarts_count() {
        let repo = MemoryUserRepository::new();
        let user = repo.create(new_user("lapse@x.com")).await.unwrap();
        if let Some(mut row) = repo.users.get_mut(&user.id) {
            row.failed_login_attempts = 5;
            row.locked_until = Some(Utc::now() - Duration::seconds(1));
        }
        let outcome = repo
            .record_failed_login(user.id, 5, Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.locked_until.is_none());
    }
}
