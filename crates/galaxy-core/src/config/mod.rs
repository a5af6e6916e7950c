//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. The loaded [`AppConfig`] is passed explicitly to every
//! constructor that needs it.

pub mod app;
pub mod auth;
pub mod cache;
pub mod database;
pub mod executor;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::{RuntimeEnvironment, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::cache::CacheConfig;
pub use self::database::DatabaseConfig;
pub use self::executor::ExecutorConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Legacy variable names still accepted for the signing secrets.
const LEGACY_ACCESS_SECRET_VAR: &str = "JWT_ACCESS_SECRET";
const LEGACY_REFRESH_SECRET_VAR: &str = "JWT_REFRESH_SECRET";
const LEGACY_ENVIRONMENT_VAR: &str = "GALAXY_ENV";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Durable store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Expiring store settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Token and credential settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// External command execution settings.
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `{base}` with an optional `config/{env}` overlay and
    /// environment variables prefixed with `GALAXY__`.
    pub fn load(base: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GALAXY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let mut loaded: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        loaded.apply_legacy_env();
        Ok(loaded)
    }

    /// Honor the secret variable names used by older deployments.
    fn apply_legacy_env(&mut self) {
        if self.auth.access_secret.is_none() {
            self.auth.access_secret = std::env::var(LEGACY_ACCESS_SECRET_VAR).ok();
        }
        if self.auth.refresh_secret.is_none() {
            self.auth.refresh_secret = std::env::var(LEGACY_REFRESH_SECRET_VAR).ok();
        }
        if let Ok(value) = std::env::var(LEGACY_ENVIRONMENT_VAR) {
            self.server.environment = RuntimeEnvironment::from_env_value(&value);
        }
    }

    /// Whether the service runs in a production-classified environment.
    pub fn is_production(&self) -> bool {
        self.server.environment.is_production()
    }
}
