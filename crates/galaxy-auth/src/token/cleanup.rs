//! Periodic purge of expired and revoked refresh rows.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info};

use galaxy_core::result::AppResult;

use super::store::TokenStore;

/// Background maintenance task around [`TokenStore::purge_expired`].
#[derive(Debug, Clone)]
pub struct TokenCleanup {
    store: Arc<TokenStore>,
    interval: Duration,
}

impl TokenCleanup {
    /// Creates a cleanup task that runs every `interval` (at least one second).
    pub fn new(store: Arc<TokenStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Runs one purge cycle and returns the number of rows deleted.
    pub async fn run_once(&self) -> AppResult<u64> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            info!(purged, "Purged expired refresh tokens");
        }
        Ok(purged)
    }

    /// Purges on every tick until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Refresh token cleanup started"
        );
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Refresh token cleanup received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Refresh token cleanup failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use galaxy_cache::CacheManager;
    use galaxy_core::config::AuthConfig;
    use galaxy_database::repositories::memory::MemoryRefreshTokenRepository;
    use galaxy_entity::user::UserRole;
    use uuid::Uuid;

    use crate::jwt::{JwtDecoder, SigningSecrets, TokenIssuer};

    fn store() -> (Arc<TokenStore>, Arc<MemoryRefreshTokenRepository>) {
        let secrets = SigningSecrets::new(
            "access-secret-access-secret-access-secret",
            "refresh-secret-refresh-secret-refresh-secret",
        )
        .unwrap();
        let repo = Arc::new(MemoryRefreshTokenRepository::new());
        let store = TokenStore::new(
            Arc::new(TokenIssuer::new(&secrets, &AuthConfig::default())),
            Arc::new(JwtDecoder::new(&secrets)),
            repo.clone(),
            CacheManager::in_memory(),
        );
        (Arc::new(store), repo)
    }

    #[tokio::test]
    async fn test_run_once_purges() {
        let (store, repo) = store();
        let stale = store
            .issue_pair_from(
                Uuid::new_v4(),
                UserRole::User,
                Uuid::new_v4(),
                Utc::now() - ChronoDuration::days(120),
            )
            .await
            .unwrap();
        store.revoke_refresh(&stale.refresh_token).await.unwrap();

        let cleanup = TokenCleanup::new(store, Duration::from_secs(60));
        assert_eq!(cleanup.run_once().await.unwrap(), 1);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (store, _) = store();
        let cleanup = TokenCleanup::new(store, Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { cleanup.run(rx).await });
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("cleanup did not stop")
            .unwrap();
    }
}
