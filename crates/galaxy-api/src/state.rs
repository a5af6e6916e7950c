//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use galaxy_auth::{SessionManager, TokenStore};
use galaxy_cache::CacheManager;
use galaxy_core::config::AppConfig;
use galaxy_database::Repositories;

use crate::cookie::RefreshCookie;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Durable store repositories
    pub repositories: Repositories,
    /// Expiring store (blacklist)
    pub cache: CacheManager,
    /// Token persistence, rotation and blacklist
    pub tokens: Arc<TokenStore>,
    /// Session lifecycle flows
    pub sessions: Arc<SessionManager>,
    /// Refresh cookie settings
    pub refresh_cookie: RefreshCookie,
}
