//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token lifecycle and credential configuration.
///
/// Secrets are optional here; whether their absence is fatal is decided at
/// startup from the runtime environment.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Access-token signing secret (HMAC-SHA256).
    #[serde(default)]
    pub access_secret: Option<String>,
    /// Refresh-token signing secret. Must differ from the access secret.
    #[serde(default)]
    pub refresh_secret: Option<String>,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_days: u64,
    /// Absolute session lifetime in days, measured from the first refresh token.
    #[serde(default = "default_max_session")]
    pub max_session_lifetime_days: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Reject common or low-entropy passwords on registration and change.
    #[serde(default = "default_true")]
    pub enforce_password_strength: bool,
    /// Failed login attempts before lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: i32,
    /// Lockout window in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
    /// Name of the refresh-token cookie.
    #[serde(default = "default_cookie_name")]
    pub refresh_cookie_name: String,
    /// Interval between purges of expired and revoked refresh rows.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_minutes: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &self.access_secret.as_ref().map(|_| "****"))
            .field("refresh_secret", &self.refresh_secret.as_ref().map(|_| "****"))
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("max_session_lifetime_days", &self.max_session_lifetime_days)
            .field("password_min_length", &self.password_min_length)
            .field("enforce_password_strength", &self.enforce_password_strength)
            .field("max_failed_attempts", &self.max_failed_attempts)
            .field("lockout_duration_minutes", &self.lockout_duration_minutes)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: None,
            refresh_secret: None,
            access_ttl_minutes: default_access_ttl(),
            refresh_ttl_days: default_refresh_ttl(),
            max_session_lifetime_days: default_max_session(),
            password_min_length: default_password_min(),
            enforce_password_strength: default_true(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
            refresh_cookie_name: default_cookie_name(),
            purge_interval_minutes: default_purge_interval(),
        }
    }
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    30
}

fn default_max_session() -> u64 {
    90
}

fn default_password_min() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_max_failed() -> i32 {
    5
}

fn default_lockout() -> u64 {
    15
}

fn default_cookie_name() -> String {
    "refresh_token".to_string()
}

fn default_purge_interval() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_secrets() {
        let config = AuthConfig {
            access_secret: Some("super-secret-access-key".into()),
            ..AuthConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-access-key"));
        assert!(rendered.contains("****"));
    }
}
