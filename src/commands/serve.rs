//! Start the Galaxy HTTP server.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::sync::watch;
use tracing::info;

use galaxy_auth::TokenCleanup;
use galaxy_cache::CacheManager;
use galaxy_core::config::AppConfig;
use galaxy_core::error::AppError;
use galaxy_database::Repositories;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.server.environment,
        "Starting Galaxy server"
    );

    // ── Step 1: Durable and expiring stores ─────────────────────
    let repositories = Repositories::from_config(&config.database).await?;
    let cache = CacheManager::new(&config.cache).await?;

    // ── Step 2: Auth stack (fails fast on missing production secrets) ──
    let state = galaxy_api::build_state(config.clone(), repositories.clone(), cache)?;

    // ── Step 3: Background refresh-token purge ──────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = TokenCleanup::new(
        Arc::clone(&state.tokens),
        Duration::from_secs(config.auth.purge_interval_minutes * 60),
    );
    let cleanup_handle = tokio::spawn(async move { cleanup.run(shutdown_rx).await });

    // ── Step 4: HTTP server with graceful shutdown ──────────────
    let app = galaxy_api::build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(address = %addr, "Galaxy server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 5: Drain background tasks ──────────────────────────
    let _ = tokio::time::timeout(Duration::from_secs(10), cleanup_handle).await;
    repositories.close().await;

    info!("Galaxy server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
