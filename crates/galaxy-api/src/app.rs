//! Application builder: wires the auth stack into `AppState` and the router.

use std::sync::Arc;

use axum::Router;
use tracing::info;

use galaxy_auth::{
    JwtDecoder, PasswordCredential, PasswordValidator, SessionManager, SigningSecrets,
    TokenIssuer, TokenStore,
};
use galaxy_cache::CacheManager;
use galaxy_core::config::AppConfig;
use galaxy_core::result::AppResult;
use galaxy_core::traits::CacheProvider;
use galaxy_database::Repositories;

use crate::cookie::RefreshCookie;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the shared state.
///
/// Resolves the signing secrets first, so a production deployment without
/// secrets fails here, before anything listens.
pub fn build_state(
    config: AppConfig,
    repositories: Repositories,
    cache: CacheManager,
) -> AppResult<AppState> {
    let secrets = SigningSecrets::resolve(&config.auth, config.server.environment)?;

    let issuer = Arc::new(TokenIssuer::new(&secrets, &config.auth));
    let decoder = Arc::new(JwtDecoder::new(&secrets));
    let tokens = Arc::new(TokenStore::new(
        issuer,
        decoder,
        repositories.refresh_tokens.clone(),
        cache.clone(),
    ));

    let credentials = PasswordCredential::new(PasswordValidator::from_config(&config.auth));
    let sessions = Arc::new(SessionManager::new(
        &repositories,
        Arc::clone(&tokens),
        credentials,
        &config.auth,
    ));

    info!(
        environment = %config.server.environment,
        cache = cache.provider_name(),
        "Auth stack initialized"
    );

    Ok(AppState {
        refresh_cookie: RefreshCookie::from_config(&config),
        config: Arc::new(config),
        repositories,
        cache,
        tokens,
        sessions,
    })
}

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}
