//! Access and refresh token issuance.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use galaxy_core::config::AuthConfig;
use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;
use galaxy_entity::user::UserRole;

use super::claims::{AccessClaims, RefreshClaims, TokenType};
use super::secrets::SigningSecrets;

/// The only algorithm tokens are signed and accepted with.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// A freshly signed token and the metadata needed to persist it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The encoded JWT.
    pub token: String,
    /// Token identifier.
    pub jti: Uuid,
    /// Issue time, truncated to whole seconds.
    pub issued_at: DateTime<Utc>,
    /// Expiry, truncated to whole seconds.
    pub expires_at: DateTime<Utc>,
}

/// Creates signed JWT access and refresh tokens.
///
/// Access and refresh tokens use separate keys, so a leaked access key
/// cannot mint refresh tokens and vice versa.
#[derive(Clone)]
pub struct TokenIssuer {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    max_session_lifetime: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("max_session_lifetime", &self.max_session_lifetime)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates a new issuer from resolved secrets and auth configuration.
    pub fn new(secrets: &SigningSecrets, config: &AuthConfig) -> Self {
        Self {
            access_key: EncodingKey::from_secret(secrets.access()),
            refresh_key: EncodingKey::from_secret(secrets.refresh()),
            access_ttl: Duration::minutes(config.access_ttl_minutes as i64),
            refresh_ttl: Duration::days(config.refresh_ttl_days as i64),
            max_session_lifetime: Duration::days(config.max_session_lifetime_days as i64),
        }
    }

    /// Access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Absolute lifetime of a refresh chain.
    pub fn max_session_lifetime(&self) -> Duration {
        self.max_session_lifetime
    }

    /// Issues an access token for `user_id` in session `session_id`.
    pub fn issue_access(
        &self,
        user_id: Uuid,
        role: UserRole,
        session_id: Uuid,
    ) -> AppResult<IssuedToken> {
        let iat = Utc::now().timestamp();
        let exp = iat + self.access_ttl.num_seconds();
        let jti = Uuid::new_v4();

        let claims = AccessClaims {
            sub: user_id,
            role,
            sid: session_id,
            jti,
            iat,
            exp,
            token_type: TokenType::Access,
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.access_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok(IssuedToken {
            token,
            jti,
            issued_at: seconds(iat),
            expires_at: seconds(exp),
        })
    }

    /// Issues a refresh token for a chain started at `session_started_at`.
    ///
    /// The expiry is clamped so that no link of the chain outlives
    /// `session_started_at + max_session_lifetime`.
    pub fn issue_refresh(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        session_started_at: DateTime<Utc>,
    ) -> AppResult<IssuedToken> {
        let iat = Utc::now().timestamp();
        let sst = session_started_at.timestamp();
        let exp = (iat + self.refresh_ttl.num_seconds())
            .min(sst + self.max_session_lifetime.num_seconds());
        let jti = Uuid::new_v4();

        let claims = RefreshClaims {
            sub: user_id,
            sid: session_id,
            sst,
            jti,
            iat,
            exp,
            token_type: TokenType::Refresh,
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.refresh_key)
            .map_err(|e| AppError::internal(format!("Failed to encode refresh token: {e}")))?;

        Ok(IssuedToken {
            token,
            jti,
            issued_at: seconds(iat),
            expires_at: seconds(exp),
        })
    }
}

fn seconds(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}
