// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod i18n;
pub mod machine;
pub mod protocol;
pub mod rounds;
pub mod scoring;
pub mod state;
pub mod store;
pub mod types;
pub mod watcher;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use state::AppState;

/// The full HTTP surface: WebSocket, API routes, static files
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api::router(&state))
        .fallback_service(ServeDir::new(&state.config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
