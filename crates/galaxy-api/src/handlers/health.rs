//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use galaxy_core::traits::CacheProvider;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.repositories.health_check().await.unwrap_or(false);
    let cache = state.cache.health_check().await.unwrap_or(false);
    let healthy = database && cache;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            database: label(database, state.repositories.pool().is_some()),
            cache: if cache {
                state.cache.provider_name().to_string()
            } else {
                "unavailable".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

fn label(up: bool, postgres: bool) -> String {
    match (up, postgres) {
        (false, _) => "unavailable",
        (true, true) => "postgres",
        (true, false) => "memory",
    }
    .to_string()
}
