//! Backend selection for the repositories.

use std::sync::Arc;

use tracing::info;

use galaxy_core::config::DatabaseConfig;
use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;

use crate::connection::DatabasePool;
use crate::migration::run_migrations;
use crate::repositories::memory::{
    MemoryRefreshTokenRepository, MemorySessionRepository, MemoryUserRepository,
};
use crate::repositories::postgres::{
    PgRefreshTokenRepository, PgSessionRepository, PgUserRepository,
};
use crate::repositories::{RefreshTokenRepository, SessionRepository, UserRepository};

/// The repositories the auth layer needs, behind trait objects.
#[derive(Debug, Clone)]
pub struct Repositories {
    /// User accounts.
    pub users: Arc<dyn UserRepository>,
    /// Refresh-token rows.
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    /// Session audit rows.
    pub sessions: Arc<dyn SessionRepository>,
    pool: Option<DatabasePool>,
}

impl Repositories {
    /// Build repositories for the configured provider.
    pub async fn from_config(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "postgres" => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(pool.pool()).await?;
                }
                Ok(Self::postgres(pool))
            }
            "memory" => {
                info!("Using in-memory repositories; data is lost on restart");
                Ok(Self::in_memory())
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Expected 'postgres' or 'memory'"
            ))),
        }
    }

    /// Repositories backed by a PostgreSQL pool.
    pub fn postgres(pool: DatabasePool) -> Self {
        let pg = pool.pool().clone();
        Self {
            users: Arc::new(PgUserRepository::new(pg.clone())),
            refresh_tokens: Arc::new(PgRefreshTokenRepository::new(pg.clone())),
            sessions: Arc::new(PgSessionRepository::new(pg)),
            pool: Some(pool),
        }
    }

    /// Process-local repositories.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            refresh_tokens: Arc::new(MemoryRefreshTokenRepository::new()),
            sessions: Arc::new(MemorySessionRepository::new()),
            pool: None,
        }
    }

    /// The Postgres pool, if this is the Postgres backend.
    pub fn pool(&self) -> Option<&DatabasePool> {
        self.pool.as_ref()
    }

    /// Check that the durable store is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(true),
        }
    }

    /// Close the pool, if any.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::ErrorKind;

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let config = DatabaseConfig {
            provider: "sqlite".into(),
            ..DatabaseConfig::default()
        };
        let err = Repositories::from_config(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_memory_provider_is_healthy() {
        let config = DatabaseConfig {
            provider: "memory".into(),
            ..DatabaseConfig::default()
        };
        let repos = Repositories::from_config(&config).await.unwrap();
        assert!(repos.pool().is_none());
        assert!(repos.health_check().await.unwrap());
    }
}
