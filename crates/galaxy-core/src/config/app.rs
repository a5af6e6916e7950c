//! HTTP server and runtime environment configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Deployment classification. Governs whether missing secrets are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Local development.
    #[default]
    Development,
    /// Automated tests.
    Test,
    /// Production deployment.
    Production,
}

impl RuntimeEnvironment {
    /// Whether this is a production-classified environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Parse from the `GALAXY_ENV` style value. Unknown values are production.
    pub fn from_env_value(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "test" => Self::Test,
            _ => Self::Production,
        }
    }
}

impl fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Test => write!(f, "test"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment classification.
    #[serde(default)]
    pub environment: RuntimeEnvironment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: RuntimeEnvironment::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}
