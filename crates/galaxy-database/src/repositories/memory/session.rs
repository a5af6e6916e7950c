//! In-memory session audit repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use galaxy_core::result::AppResult;
use galaxy_entity::session::{SessionEndReason, SessionRecord};

use crate::repositories::SessionRepository;

/// Session rows keyed by session id.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: DashMap<Uuid, SessionRecord>,
}

impl MemorySessionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn start(&self, record: &SessionRecord) -> AppResult<()> {
        self.sessions.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SessionRecord>> {
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn touch(&self, id: Uuid) -> AppResult<()> {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            if session.is_active() {
                session.last_activity = Utc::now();
            }
        }
        Ok(())
    }

    async fn end(&self, id: Uuid, reason: SessionEndReason) -> AppResult<bool> {
        match self.sessions.get_mut(&id) {
            Some(mut session) if session.is_active() => {
                session.ended_at = Some(Utc::now());
                session.end_reason = Some(reason.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn end_all_for_user(&self, user_id: Uuid, reason: SessionEndReason) -> AppResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for mut session in self.sessions.iter_mut() {
            if session.user_id == user_id && session.is_active() {
                session.ended_at = Some(now);
                session.end_reason = Some(reason.to_string());
                count += 1;
            }
        }
        Ok(count)
    }
}
