//! Database migration command.

use galaxy_core::config::AppConfig;
use galaxy_core::error::AppError;
use galaxy_database::DatabasePool;
use galaxy_database::migration::run_migrations;

/// Apply all pending migrations to the configured database.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    if config.database.provider != "postgres" {
        return Err(AppError::configuration(format!(
            "Migrations need the postgres provider, found '{}'",
            config.database.provider
        )));
    }

    let pool = DatabasePool::connect(&config.database).await?;
    run_migrations(pool.pool()).await?;
    pool.close().await;

    println!("All migrations applied successfully.");
    Ok(())
}
