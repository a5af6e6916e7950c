//! Token verification, rotation and revocation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use galaxy_cache::CacheManager;
use galaxy_cache::keys;
use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;
use galaxy_core::traits::CacheProvider;
use galaxy_database::RefreshTokenRepository;
use galaxy_entity::token::RefreshTokenRecord;
use galaxy_entity::user::UserRole;

use crate::jwt::{AccessClaims, IssuedToken, JwtDecoder, RefreshClaims, TokenIssuer};

/// An access token and the refresh token that can renew it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// Session both tokens are bound to.
    pub session_id: Uuid,
}

/// Value stored under a blacklisted `jti`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistEntry {
    /// Why the token was revoked.
    pub reason: String,
    /// Owner of the token.
    pub user_id: Uuid,
    /// When the entry was written.
    pub blacklisted_at: DateTime<Utc>,
}

/// Verifies, rotates and revokes tokens.
///
/// Refresh tokens are tracked in the durable store (by SHA-256 hash);
/// revoked access tokens are tracked in the expiring store until they
/// would have expired anyway.
#[derive(Clone)]
pub struct TokenStore {
    issuer: Arc<TokenIssuer>,
    decoder: Arc<JwtDecoder>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    cache: CacheManager,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("issuer", &self.issuer)
            .field("cache", &self.cache.provider_name())
            .finish()
    }
}

impl TokenStore {
    /// Creates a new token store.
    pub fn new(
        issuer: Arc<TokenIssuer>,
        decoder: Arc<JwtDecoder>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        cache: CacheManager,
    ) -> Self {
        Self {
            issuer,
            decoder,
            refresh_tokens,
            cache,
        }
    }

    /// The issuer used for new tokens.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Issues the first access/refresh pair of a new session and persists
    /// the refresh row.
    pub async fn issue_pair(
        &self,
        user_id: Uuid,
        role: UserRole,
        session_id: Uuid,
    ) -> AppResult<TokenPair> {
        self.issue_pair_from(user_id, role, session_id, Utc::now())
            .await
    }

    pub(crate) async fn issue_pair_from(
        &self,
        user_id: Uuid,
        role: UserRole,
        session_id: Uuid,
        session_started_at: DateTime<Utc>,
    ) -> AppResult<TokenPair> {
        let access = self.issuer.issue_access(user_id, role, session_id)?;
        let refresh = self
            .issuer
            .issue_refresh(user_id, session_id, session_started_at)?;

        let record = refresh_record(&refresh, user_id, session_id, session_started_at);
        self.refresh_tokens.insert(&record).await?;

        Ok(pair(access, refresh, session_id))
    }

    /// Verifies an access token: signature, algorithm, expiry, then blacklist.
    pub async fn verify_access(&self, token: &str) -> AppResult<AccessClaims> {
        let claims = self.decoder.decode_access(token)?;

        if self.cache.exists(&keys::access_blacklist(claims.jti)).await? {
            debug!(jti = %claims.jti, user_id = %claims.sub, "Rejected blacklisted access token");
            return Err(AppError::token_revoked("Token has been revoked"));
        }
        Ok(claims)
    }

    /// Verifies a refresh token against its persisted row.
    ///
    /// Absent or revoked rows fail before expiry is considered. Expiry
    /// covers both the token's own `exp` and the chain's absolute lifetime.
    pub async fn verify_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        let claims = self.decoder.decode_refresh(token)?;

        let row = self
            .refresh_tokens
            .find(claims.jti, &token_hash(token))
            .await?
            .filter(|row| !row.revoked && row.user_id == claims.sub)
            .ok_or_else(|| AppError::refresh_token_invalid("Refresh token not found or revoked"))?;

        let now = Utc::now();
        if claims.is_expired() || row.is_expired_at(now) {
            return Err(AppError::token_expired("Refresh token has expired"));
        }
        if now - row.session_started_at > self.issuer.max_session_lifetime() {
            return Err(AppError::token_expired(
                "Session exceeded its maximum lifetime",
            ));
        }
        Ok(claims)
    }

    /// Replaces a refresh token with a new pair in one atomic step.
    ///
    /// The old row is revoked and the new row inserted together; if either
    /// fails nothing changes. A token that has already been rotated fails
    /// with `RefreshTokenInvalid`.
    pub async fn rotate(
        &self,
        old_token: &str,
        user_id: Uuid,
        role: UserRole,
    ) -> AppResult<TokenPair> {
        let old = self.verify_refresh(old_token).await?;
        if old.sub != user_id {
            return Err(AppError::invalid_token("Refresh token subject mismatch"));
        }

        let started = old.session_started_at();
        let access = self.issuer.issue_access(user_id, role, old.sid)?;
        let refresh = self.issuer.issue_refresh(user_id, old.sid, started)?;
        let record = refresh_record(&refresh, user_id, old.sid, started);

        self.refresh_tokens.rotate(old.jti, &record).await?;

        info!(
            user_id = %user_id,
            session_id = %old.sid,
            "Rotated refresh token"
        );
        Ok(pair(access, refresh, old.sid))
    }

    /// Blacklists an access token for the rest of its lifetime.
    ///
    /// An already-expired token needs no entry and is accepted silently.
    pub async fn blacklist_access(&self, token: &str, reason: &str) -> AppResult<()> {
        match self.decoder.decode_access(token) {
            Ok(claims) => self.blacklist_claims(&claims, reason).await,
            Err(e) if e.kind == galaxy_core::ErrorKind::TokenExpired => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Blacklists already-verified access claims.
    pub async fn blacklist_claims(&self, claims: &AccessClaims, reason: &str) -> AppResult<()> {
        let ttl = claims.remaining_ttl();
        if ttl.is_zero() {
            return Ok(());
        }

        let entry = BlacklistEntry {
            reason: reason.to_string(),
            user_id: claims.sub,
            blacklisted_at: Utc::now(),
        };
        let value = serde_json::to_string(&entry)?;
        self.cache
            .set(&keys::access_blacklist(claims.jti), &value, ttl)
            .await?;

        debug!(
            jti = %claims.jti,
            user_id = %claims.sub,
            reason,
            ttl_ms = ttl.as_millis() as u64,
            "Blacklisted access token"
        );
        Ok(())
    }

    /// Revokes the row of a presented refresh token.
    ///
    /// Returns whether a live row was revoked.
    pub async fn revoke_refresh(&self, token: &str) -> AppResult<bool> {
        let claims = self.decoder.decode_refresh(token)?;
        match self.refresh_tokens.find(claims.jti, &token_hash(token)).await? {
            Some(row) => self.refresh_tokens.revoke(row.jti).await,
            None => Ok(false),
        }
    }

    /// Revokes every refresh row of a user.
    pub async fn revoke_all_for_subject(&self, user_id: Uuid) -> AppResult<u64> {
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "Revoked all refresh tokens");
        Ok(revoked)
    }

    /// Deletes refresh rows that are both expired and revoked.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.refresh_tokens.purge_expired().await
    }
}

/// Hex SHA-256 of an encoded token. Only this is persisted.
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn refresh_record(
    refresh: &IssuedToken,
    user_id: Uuid,
    session_id: Uuid,
    session_started_at: DateTime<Utc>,
) -> RefreshTokenRecord {
    RefreshTokenRecord {
        jti: refresh.jti,
        user_id,
        session_id,
        token_hash: token_hash(&refresh.token),
        session_started_at,
        issued_at: refresh.issued_at,
        expires_at: refresh.expires_at,
        revoked: false,
        revoked_at: None,
    }
}

fn pair(access: IssuedToken, refresh: IssuedToken, session_id: Uuid) -> TokenPair {
    TokenPair {
        access_token: access.token,
        access_expires_at: access.expires_at,
        refresh_token: refresh.token,
        refresh_expires_at: refresh.expires_at,
        session_id,
    }
}
