//! JWT claims carried by access and refresh tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use galaxy_entity::user::UserRole;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token for API requests.
    Access,
    /// Long-lived refresh token for obtaining new access tokens.
    Refresh,
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User role at the time of issuance.
    pub role: UserRole,
    /// Session this token belongs to.
    pub sid: Uuid,
    /// Token identifier, the blacklist key.
    pub jti: Uuid,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Always [`TokenType::Access`].
    pub token_type: TokenType,
}

/// Claims embedded in every refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Session this chain belongs to.
    pub sid: Uuid,
    /// Issue time of the first token in the chain (seconds since epoch).
    pub sst: i64,
    /// Token identifier, the refresh row key.
    pub jti: Uuid,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Always [`TokenType::Refresh`].
    pub token_type: TokenType,
}

impl AccessClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp(self.exp)
    }

    /// Time left until expiry, zero once expired.
    pub fn remaining_ttl(&self) -> Duration {
        remaining(self.exp)
    }
}

impl RefreshClaims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        timestamp(self.exp)
    }

    /// When the chain this token belongs to was started.
    pub fn session_started_at(&self) -> DateTime<Utc> {
        timestamp(self.sst)
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn remaining(exp: i64) -> Duration {
    let left_ms = exp.saturating_mul(1000) - Utc::now().timestamp_millis();
    if left_ms > 0 {
        Duration::from_millis(left_ms as u64)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(exp: i64) -> AccessClaims {
        AccessClaims {
            sub: Uuid::new_v4(),
            role: UserRole::User,
            sid: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: Utc::now().timestamp(),
            exp,
            token_type: TokenType::Access,
        }
    }

    #[test]
    fn test_remaining_ttl_never_exceeds_expiry() {
        let claims = access(Utc::now().timestamp() + 900);
        let ttl = claims.remaining_ttl();
        assert!(ttl <= Duration::from_secs(900));
        assert!(ttl > Duration::from_secs(890));
    }

    #[test]
    fn test_remaining_ttl_zero_when_expired() {
        let claims = access(Utc::now().timestamp() - 10);
        assert_eq!(claims.remaining_ttl(), Duration::ZERO);
    }
}
