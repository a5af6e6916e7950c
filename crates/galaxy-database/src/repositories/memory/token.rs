//! In-memory refresh-token repository.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;
use galaxy_entity::token::RefreshTokenRecord;

use crate::repositories::RefreshTokenRepository;

/// Refresh-token rows keyed by `jti`.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenRepository {
    rows: DashMap<Uuid, RefreshTokenRecord>,
}

impl MemoryRefreshTokenRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, revoked or not.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flip `revoked` on a live row. The shard guard makes check-and-set atomic.
    fn revoke_live(&self, jti: Uuid) -> bool {
        match self.rows.get_mut(&jti) {
            Some(mut row) if !row.revoked => {
                row.revoked = true;
                row.revoked_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryRefreshTokenRepository {
    async fn insert(&self, record: &RefreshTokenRecord) -> AppResult<()> {
        self.rows.insert(record.jti, record.clone());
        Ok(())
    }

    async fn find(&self, jti: Uuid, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>> {
        Ok(self
            .rows
            .get(&jti)
            .filter(|row| row.token_hash == token_hash)
            .map(|row| row.value().clone()))
    }

    async fn rotate(&self, old_jti: Uuid, next: &RefreshTokenRecord) -> AppResult<()> {
        if !self.revoke_live(old_jti) {
            return Err(AppError::refresh_token_invalid(
                "Refresh token not found or revoked",
            ));
        }
        self.rows.insert(next.jti, next.clone());
        Ok(())
    }

    async fn revoke(&self, jti: Uuid) -> AppResult<bool> {
        Ok(self.revoke_live(jti))
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for mut row in self.rows.iter_mut() {
            if row.user_id == user_id && !row.revoked {
                row.revoked = true;
                row.revoked_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        let before = self.rows.len();
        self.rows.retain(|_, row| !row.is_purgeable_at(now));
        Ok(before.saturating_sub(self.rows.len()) as u64)
    }
}
