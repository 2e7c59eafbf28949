//! HTTP API endpoints.
//!
//! Game lookup and leaderboards are public. Game creation and snapshot
//! export/import need the admin session token obtained from the login route.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{admin_auth_middleware, basic_credentials};
use crate::error::{GameError, GameResult};
use crate::scoring::PlayerScore;
use crate::state::export::GameStateExport;
use crate::state::AppState;
use crate::types::{GameStatus, Language, Pin};

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    msg: String,
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            code: self.code(),
            msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /api/admin/login
///
/// Exchanges HTTP Basic credentials for an admin session token.
pub async fn login(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let token = basic_credentials(&headers)
        .and_then(|(username, password)| state.auth.login(&username, &password));
    match token {
        Some(token) => {
            tracing::info!("Admin logged in");
            Json(LoginResponse { token }).into_response()
        }
        None => {
            tracing::warn!("Rejected admin login");
            GameError::Unauthorized.into_response()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedGame {
    pub pin: Pin,
}

/// POST /api/games
pub async fn create_game(State(state): State<Arc<AppState>>) -> GameResult<Json<CreatedGame>> {
    let game = state.create_game(state.auth.admin_id()).await?;
    Ok(Json(CreatedGame { pin: game.pin }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameSummary {
    pub pin: Pin,
    pub status: GameStatus,
    pub player_count: usize,
}

/// GET /api/games/{pin}
///
/// Lets a join screen check a PIN before opening a socket.
pub async fn game_summary(
    State(state): State<Arc<AppState>>,
    Path(pin): Path<Pin>,
) -> GameResult<Json<GameSummary>> {
    let game = state.get_game(&pin).await?;
    Ok(Json(GameSummary {
        pin: game.pin,
        status: game.status,
        player_count: game.players.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

/// GET /api/games/{pin}/leaderboard?lang=
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Path(pin): Path<Pin>,
    Query(query): Query<LangQuery>,
) -> GameResult<Json<Vec<PlayerScore>>> {
    let lang = query
        .lang
        .as_deref()
        .and_then(Language::parse)
        .unwrap_or_default();
    Ok(Json(state.get_leaderboard(&pin, lang).await?))
}

/// Export every live game as JSON.
///
/// GET /api/state/export
pub async fn export_state(
    State(state): State<Arc<AppState>>,
) -> GameResult<Json<GameStateExport>> {
    Ok(Json(state.export_state().await?))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: usize,
}

/// Import a game state snapshot.
///
/// POST /api/state/import
///
/// Replaces all live games with the imported ones. Connected clients pick
/// the new state up through their subscriptions.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(export): Json<GameStateExport>,
) -> GameResult<Json<ImportResponse>> {
    let imported = state.import_state(export).await?;
    tracing::info!("Imported {} games", imported);
    Ok(Json(ImportResponse { imported }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// All HTTP API routes; the caller supplies the state
pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let admin_routes = Router::new()
        .route("/api/games", post(create_game))
        .route("/api/state/export", get(export_state))
        .route("/api/state/import", post(import_state))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/games/{pin}", get(game_summary))
        .route("/api/games/{pin}/leaderboard", get(leaderboard))
        .route("/health", get(health))
        .merge(admin_routes)
}
