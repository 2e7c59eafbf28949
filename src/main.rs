use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fakenews::{auth::AuthConfig, config::ServerConfig, state::AppState, watcher};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fakenews=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fake News server...");

    let config = ServerConfig::from_env();
    let auth = AuthConfig::from_env();
    let state = Arc::new(AppState::new(config.clone(), auth));

    if let Some(path) = &config.snapshot_path {
        match state.load_snapshot(path).await {
            Ok(Some(count)) => tracing::info!("Restored {} games from {}", count, path.display()),
            Ok(None) => tracing::info!("No snapshot at {}, starting empty", path.display()),
            Err(e) => tracing::error!("Failed to restore snapshot: {}", e),
        }
        watcher::spawn_snapshot_autosave(state.clone(), path.clone(), config.snapshot_interval);
    }

    if config.auto_advance {
        tracing::info!("Server-side auto-advance enabled");
        watcher::spawn_deadline_watcher(state.clone());
    }

    let app = fakenews::app(state.clone());

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", config.bind_addr);

    let serve = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Shutting down");
    });
    if let Err(e) = serve.await {
        tracing::error!("Server error: {}", e);
    }

    if let Some(path) = &config.snapshot_path {
        match state.save_snapshot(path).await {
            Ok(count) => tracing::info!("Saved {} games to {}", count, path.display()),
            Err(e) => tracing::error!("Final snapshot failed: {}", e),
        }
    }
    state.store.shutdown().await;
}
