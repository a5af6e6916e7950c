//! One-shot refresh-token purge.

use std::sync::Arc;
use std::time::Duration;

use galaxy_cache::CacheManager;
use galaxy_core::config::AppConfig;
use galaxy_core::error::AppError;
use galaxy_database::Repositories;

/// Delete refresh rows that are expired and revoked, then exit.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let repositories = Repositories::from_config(&config.database).await?;
    let cache = CacheManager::new(&config.cache).await?;
    let state = galaxy_api::build_state(config.clone(), repositories.clone(), cache)?;

    let purged = galaxy_auth::TokenCleanup::new(
        Arc::clone(&state.tokens),
        Duration::from_secs(config.auth.purge_interval_minutes * 60),
    )
    .run_once()
    .await?;
    println!("Purged {purged} refresh tokens");

    repositories.close().await;
    Ok(())
}
