//! Session lifecycle manager: registration, login, refresh and revocation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use galaxy_core::config::AuthConfig;
use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;
use galaxy_database::{Repositories, SessionRepository, UserRepository};
use galaxy_entity::session::{SessionEndReason, SessionRecord};
use galaxy_entity::user::{CreateUser, User, UserRole};

use crate::jwt::AccessClaims;
use crate::password::PasswordCredential;
use crate::token::{TokenPair, TokenStore};

/// Request metadata recorded on the session audit row.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Client address.
    pub ip_address: Option<String>,
    /// User-Agent header.
    pub user_agent: Option<String>,
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// The authenticated user.
    pub user: User,
    /// Freshly issued tokens.
    pub tokens: TokenPair,
}

/// Orchestrates credentials, token issuance and the token store.
///
/// Holds no per-session state; everything lives in the repositories and
/// the expiring store.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    tokens: Arc<TokenStore>,
    credentials: PasswordCredential,
    max_failed_attempts: i32,
    lockout: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("max_failed_attempts", &self.max_failed_attempts)
            .field("lockout", &self.lockout)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        repositories: &Repositories,
        tokens: Arc<TokenStore>,
        credentials: PasswordCredential,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users: repositories.users.clone(),
            sessions: repositories.sessions.clone(),
            tokens,
            credentials,
            max_failed_attempts: config.max_failed_attempts,
            lockout: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// The token store used by this manager.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// The credential service used by this manager.
    pub fn credentials(&self) -> &PasswordCredential {
        &self.credentials
    }

    /// Creates an account and signs it in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<String>,
        client: ClientInfo,
    ) -> AppResult<AuthOutcome> {
        let email = normalize_email(email)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let credential = self.credentials.create_async(password.to_string()).await?;
        let user = self
            .users
            .create(CreateUser {
                email,
                password_hash: credential.hash,
                password_salt: credential.salt,
                display_name,
                role: UserRole::User,
            })
            .await?;

        let tokens = self.start_session(&user, client).await?;
        info!(user_id = %user.id, session_id = %tokens.session_id, "User registered");
        Ok(AuthOutcome { user, tokens })
    }

    /// Authenticates with email and password.
    ///
    /// Unknown emails and wrong passwords fail identically. After
    /// `max_failed_attempts` consecutive failures the account is locked
    /// for the lockout window, even for the correct password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> AppResult<AuthOutcome> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.credentials.burn_async(password.to_string()).await;
            debug!("Login attempt for unknown email");
            return Err(AppError::invalid_credentials());
        };

        if user.is_locked_at(Utc::now()) {
            warn!(user_id = %user.id, "Login attempt on locked account");
            return Err(locked_error());
        }

        let valid = self
            .credentials
            .verify_async(
                password.to_string(),
                user.password_hash.clone(),
                user.password_salt.clone(),
            )
            .await?;

        if !valid {
            let outcome = self
                .users
                .record_failed_login(user.id, self.max_failed_attempts, self.lockout)
                .await?;
            if let Some(until) = outcome.locked_until {
                warn!(
                    user_id = %user.id,
                    attempts = outcome.attempts,
                    locked_until = %until,
                    "Account locked after repeated login failures"
                );
                return Err(locked_error());
            }
            warn!(user_id = %user.id, attempts = outcome.attempts, "Failed login attempt");
            return Err(AppError::invalid_credentials());
        }

        self.users.record_successful_login(user.id).await?;
        let tokens = self.start_session(&user, client).await?;
        info!(user_id = %user.id, session_id = %tokens.session_id, "Login successful");
        Ok(AuthOutcome { user, tokens })
    }

    /// Exchanges a refresh token for a new pair, revoking the old one.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.tokens.verify_refresh(refresh_token).await?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::refresh_token_invalid("Refresh token not found or revoked"))?;

        let pair = self.tokens.rotate(refresh_token, user.id, user.role).await?;
        self.sessions.touch(claims.sid).await?;
        Ok(pair)
    }

    /// Ends the session of `access_token`.
    ///
    /// The access token is blacklisted, the refresh row (if presented) is
    /// revoked and the audit row is closed.
    pub async fn logout(&self, access_token: &str, refresh_token: Option<&str>) -> AppResult<()> {
        let claims = self.tokens.verify_access(access_token).await?;
        self.tokens.blacklist_claims(&claims, "logout").await?;

        if let Some(refresh) = refresh_token {
            match self.tokens.revoke_refresh(refresh).await {
                Ok(_) => {}
                Err(e) if e.kind.is_internal() => return Err(e),
                Err(e) => debug!(error = %e, "Ignoring unusable refresh token on logout"),
            }
        }

        self.sessions
            .end(claims.sid, SessionEndReason::Logout)
            .await?;
        info!(user_id = %claims.sub, session_id = %claims.sid, "User logged out");
        Ok(())
    }

    /// Verifies an access token.
    pub async fn verify(&self, access_token: &str) -> AppResult<AccessClaims> {
        self.tokens.verify_access(access_token).await
    }

    /// Signs the user out everywhere. Returns the number of refresh rows revoked.
    pub async fn revoke_all(&self, access_token: &str) -> AppResult<u64> {
        let claims = self.tokens.verify_access(access_token).await?;
        let revoked = self.tokens.revoke_all_for_subject(claims.sub).await?;
        self.sessions
            .end_all_for_user(claims.sub, SessionEndReason::RevokeAll)
            .await?;
        self.tokens.blacklist_claims(&claims, "revoke_all").await?;
        Ok(revoked)
    }

    /// Replaces the credential and signs the user out everywhere.
    pub async fn change_password(
        &self,
        access_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let claims = self.tokens.verify_access(access_token).await?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::invalid_token("Token subject no longer exists"))?;

        let valid = self
            .credentials
            .verify_async(
                current_password.to_string(),
                user.password_hash.clone(),
                user.password_salt.clone(),
            )
            .await?;
        if !valid {
            return Err(AppError::invalid_credentials());
        }
        if current_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }

        let credential = self
            .credentials
            .create_async(new_password.to_string())
            .await?;
        self.users
            .update_credential(user.id, &credential.hash, &credential.salt)
            .await?;

        self.tokens.revoke_all_for_subject(user.id).await?;
        self.sessions
            .end_all_for_user(user.id, SessionEndReason::PasswordChange)
            .await?;
        self.tokens
            .blacklist_claims(&claims, "password_change")
            .await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    async fn start_session(&self, user: &User, client: ClientInfo) -> AppResult<TokenPair> {
        let session_id = Uuid::new_v4();
        self.sessions
            .start(&SessionRecord::start(
                session_id,
                user.id,
                client.ip_address,
                client.user_agent,
            ))
            .await?;
        self.tokens.issue_pair(user.id, user.role, session_id).await
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !email.validate_email() {
        return Err(AppError::validation("Invalid email address"));
    }
    Ok(email)
}

fn locked_error() -> AppError {
    AppError::account_locked("Too many failed login attempts. Try again later.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use galaxy_cache::CacheManager;
    use galaxy_core::ErrorKind;

    use crate::jwt::{JwtDecoder, SigningSecrets, TokenIssuer};
    use crate::password::PasswordValidator;

    const EMAIL: &str = "a@x.com";
    const PASSWORD: &str = "Str0ng!Pass";

    struct Harness {
        manager: SessionManager,
        repos: Repositories,
    }

    fn harness() -> Harness {
        let config = AuthConfig::default();
        let secrets = SigningSecrets::new(
            "access-secret-access-secret-access-secret",
            "refresh-secret-refresh-secret-refresh-secret",
        )
        .unwrap();
        let repos = Repositories::in_memory();
        let tokens = Arc::new(TokenStore::new(
            Arc::new(TokenIssuer::new(&secrets, &config)),
            Arc::new(JwtDecoder::new(&secrets)),
            repos.refresh_tokens.clone(),
            CacheManager::in_memory(),
        ));
        let credentials = PasswordCredential::new(PasswordValidator::from_config(&config));
        let manager = SessionManager::new(&repos, tokens, credentials, &config);
        Harness { manager, repos }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("127.0.0.1".into()),
            user_agent: Some("test-agent".into()),
        }
    }

    #[tokio::test]
    async fn test_full_session_scenario() {
        let h = harness();
        h.manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();

        let login = h.manager.login(EMAIL, PASSWORD, client()).await.unwrap();
        let access = login.tokens.access_token.clone();
        let refresh = login.tokens.refresh_token.clone();

        let rotated = h.manager.refresh(&refresh).await.unwrap();
        assert_ne!(rotated.refresh_token, refresh);
        let err = h.manager.tokens().verify_refresh(&refresh).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RefreshTokenInvalid);

        assert!(h.manager.verify(&access).await.is_ok());
        h.manager
            .logout(&access, Some(&rotated.refresh_token))
            .await
            .unwrap();
        let err = h.manager.verify(&access).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenRevoked);
        let err = h
            .manager
            .refresh(&rotated.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RefreshTokenInvalid);

        let session = h
            .repos
            .sessions
            .find_by_id(login.tokens.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.end_reason.as_deref(), Some("logout"));
        assert_eq!(session.ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let h = harness();
        h.manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();
        let err = h
            .manager
            .register("A@X.com", PASSWORD, None, client())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_weak_and_malformed_registration() {
        let h = harness();
        let err = h
            .manager
            .register(EMAIL, "password", None, client())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::WeakPassword);

        let err = h
            .manager
            .register("not-an-email", PASSWORD, None, client())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_alike() {
        let h = harness();
        h.manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();

        let unknown = h
            .manager
            .login("nobody@x.com", PASSWORD, client())
            .await
            .unwrap_err();
        let wrong = h
            .manager
            .login(EMAIL, "Wr0ng!Pass", client())
            .await
            .unwrap_err();
        assert_eq!(unknown.kind, ErrorKind::InvalidCredentials);
        assert_eq!(wrong.kind, ErrorKind::InvalidCredentials);
        assert_eq!(unknown.message, wrong.message);
    }

    #[tokio::test]
    async fn test_lockout_blocks_correct_password() {
        let h = harness();
        h.manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();

        for _ in 0..4 {
            let err = h
                .manager
                .login(EMAIL, "Wr0ng!Pass", client())
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidCredentials);
        }
        let fifth = h
            .manager
            .login(EMAIL, "Wr0ng!Pass", client())
            .await
            .unwrap_err();
        assert_eq!(fifth.kind, ErrorKind::AccountLocked);

        let sixth = h
            .manager
            .login(EMAIL, PASSWORD, client())
            .await
            .unwrap_err();
        assert_eq!(sixth.kind, ErrorKind::AccountLocked);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let h = harness();
        let outcome = h
            .manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();
        for _ in 0..3 {
            let _ = h.manager.login(EMAIL, "Wr0ng!Pass", client()).await;
        }
        h.manager.login(EMAIL, PASSWORD, client()).await.unwrap();

        let user = h
            .repos
            .users
            .find_by_id(outcome.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.failed_login_attempts, 0);
    }

    #[tokio::test]
    async fn test_revoke_all_ends_every_session() {
        let h = harness();
        let first = h
            .manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();
        let second = h.manager.login(EMAIL, PASSWORD, client()).await.unwrap();

        let revoked = h
            .manager
            .revoke_all(&second.tokens.access_token)
            .await
            .unwrap();
        assert_eq!(revoked, 2);

        assert_eq!(
            h.manager
                .verify(&second.tokens.access_token)
                .await
                .unwrap_err()
                .kind,
            ErrorKind::TokenRevoked
        );
        assert_eq!(
            h.manager
                .refresh(&first.tokens.refresh_token)
                .await
                .unwrap_err()
                .kind,
            ErrorKind::RefreshTokenInvalid
        );
        let session = h
            .repos
            .sessions
            .find_by_id(first.tokens.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.end_reason.as_deref(), Some("revoke_all"));
    }

    #[tokio::test]
    async fn test_change_password_replaces_credential() {
        let h = harness();
        let reg = h
            .manager
            .register(EMAIL, PASSWORD, None, client())
            .await
            .unwrap();
        let before = h
            .repos
            .users
            .find_by_id(reg.user.id)
            .await
            .unwrap()
            .unwrap();

        let err = h
            .manager
            .change_password(&reg.tokens.access_token, "Wr0ng!Pass", "N3w!Passphrase")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCredentials);

        h.manager
            .change_password(&reg.tokens.access_token, PASSWORD, "N3w!Passphrase")
            .await
            .unwrap();

        let after = h
            .repos
            .users
            .find_by_id(reg.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(before.password_salt, after.password_salt);
        assert_eq!(
            h.manager
                .refresh(&reg.tokens.refresh_token)
                .await
                .unwrap_err()
                .kind,
            ErrorKind::RefreshTokenInvalid
        );
        assert!(h.manager.login(EMAIL, PASSWORD, client()).await.is_err());
        assert!(
            h.manager
                .login(EMAIL, "N3w!Passphrase", client())
                .await
                .is_ok()
        );
    }
}
