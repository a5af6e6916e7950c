//! Signing-secret resolution at startup.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use tracing::warn;

use galaxy_core::config::{AuthConfig, RuntimeEnvironment};
use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;

/// Minimum secret length in bytes (256 bits).
pub const MIN_SECRET_BYTES: usize = 32;

/// Distinct HMAC secrets for access and refresh tokens.
#[derive(Clone)]
pub struct SigningSecrets {
    access: String,
    refresh: String,
}

impl std::fmt::Debug for SigningSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecrets")
            .field("access", &"****")
            .field("refresh", &"****")
            .finish()
    }
}

impl SigningSecrets {
    /// Validates a pair of externally supplied secrets.
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> AppResult<Self> {
        let access = access.into();
        let refresh = refresh.into();
        check_length("access", &access)?;
        check_length("refresh", &refresh)?;
        if access == refresh {
            return Err(AppError::configuration(
                "Access and refresh signing secrets must differ",
            ));
        }
        Ok(Self { access, refresh })
    }

    /// Resolves secrets from configuration.
    ///
    /// A missing secret is fatal in production. Elsewhere it is generated
    /// from the OS RNG and lives only as long as the process.
    pub fn resolve(config: &AuthConfig, environment: RuntimeEnvironment) -> AppResult<Self> {
        let access = Self::resolve_one("access", config.access_secret.as_deref(), environment)?;
        let refresh = Self::resolve_one("refresh", config.refresh_secret.as_deref(), environment)?;
        Self::new(access, refresh)
    }

    fn resolve_one(
        name: &str,
        supplied: Option<&str>,
        environment: RuntimeEnvironment,
    ) -> AppResult<String> {
        match supplied.filter(|s| !s.is_empty()) {
            Some(secret) => Ok(secret.to_string()),
            None if environment.is_production() => Err(AppError::configuration(format!(
                "The {name} signing secret must be configured in production"
            ))),
            None => {
                warn!(
                    secret = name,
                    environment = %environment,
                    "Signing secret not configured; generated an ephemeral one. Tokens will not survive a restart"
                );
                Ok(random_secret())
            }
        }
    }

    /// Access-token secret bytes.
    pub fn access(&self) -> &[u8] {
        self.access.as_bytes()
    }

    /// Refresh-token secret bytes.
    pub fn refresh(&self) -> &[u8] {
        self.refresh.as_bytes()
    }
}

fn check_length(name: &str, secret: &str) -> AppResult<()> {
    if secret.len() < MIN_SECRET_BYTES {
        return Err(AppError::configuration(format!(
            "The {name} signing secret must be at least {MIN_SECRET_BYTES} bytes"
        )));
    }
    Ok(())
}

fn random_secret() -> String {
    let mut bytes = [0u8; MIN_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_core::ErrorKind;

    const A: &str = "access-secret-access-secret-access-secret";
    const B: &str = "refresh-secret-refresh-secret-refresh-secret";

    #[test]
    fn test_missing_secret_fatal_in_production() {
        let config = AuthConfig::default();
        let err = SigningSecrets::resolve(&config, RuntimeEnvironment::Production).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_missing_secret_generated_in_development() {
        let config = AuthConfig::default();
        let secrets = SigningSecrets::resolve(&config, RuntimeEnvironment::Development).unwrap();
        assert_eq!(secrets.access().len(), MIN_SECRET_BYTES * 2);
        assert_ne!(secrets.access(), secrets.refresh());
    }

    #[test]
    fn test_short_or_equal_secrets_rejected() {
        assert!(SigningSecrets::new("short", B).is_err());
        assert!(SigningSecrets::new(A, A).is_err());
        assert!(SigningSecrets::new(A, B).is_ok());
    }

    #[test]
    fn test_supplied_secrets_used_in_production() {
        let config = AuthConfig {
            access_secret: Some(A.into()),
            refresh_secret: Some(B.into()),
            ..AuthConfig::default()
        };
        let secrets = SigningSecrets::resolve(&config, RuntimeEnvironment::Production).unwrap();
        assert_eq!(secrets.access(), A.as_bytes());
        assert!(!format!("{secrets:?}").contains(A));
    }
}
