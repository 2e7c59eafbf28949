mod admin;
pub mod handlers;
mod player;

pub use handlers::{handle_message, Session};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::machine;
use crate::protocol::{ClientMessage, GameView, ServerMessage, PROTOCOL_VERSION};
use crate::state::{now_ms, AppState};
use crate::store::GameSubscription;
use crate::types::{Game, Language, Role};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
    pub token: Option<String>,
    pub lang: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let role = match params.role.as_deref() {
        Some("admin") => Role::Admin,
        _ => Role::Player,
    };

    if role == Role::Admin && !state.verify_admin(params.token.as_deref().unwrap_or_default()) {
        tracing::warn!("Rejected admin WebSocket with invalid token");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let lang = params
        .lang
        .as_deref()
        .and_then(Language::parse)
        .unwrap_or_default();
    tracing::info!("WebSocket connection request: role={:?}, lang={:?}", role, lang);

    ws.on_upgrade(move |socket| handle_socket(socket, Session::new(role, lang), state))
}

type WsSender = SplitSink<WebSocket, Message>;

async fn send(sender: &mut WsSender, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// The message a session should get for a new game state.
/// Clears the session's binding when its player is gone.
fn render(session: &mut Session, game: &Game) -> ServerMessage {
    match session.role {
        Role::Admin => ServerMessage::AdminGameUpdate {
            game: GameView::for_admin(game, session.lang),
            triggers: machine::advance_triggers(game, now_ms()),
        },
        Role::Player => {
            if let Some(player_id) = &session.player_id {
                if !game.players.contains_key(player_id) {
                    tracing::info!("Player {} was removed from game {}", player_id, game.pin);
                    session.player_id = None;
                    session.pin = None;
                    return ServerMessage::Kicked;
                }
            }
            ServerMessage::GameUpdate {
                game: GameView::for_player(game, session.player_id.as_deref(), session.lang),
            }
        }
    }
}

/// Milliseconds until the admin's watched round expires, so the triggers can
/// be re-sent at that moment
fn admin_deadline(session: &Session, game: Option<&Game>) -> Option<Duration> {
    if session.role != Role::Admin {
        return None;
    }
    let round = game?.current_round_data()?;
    let remaining = round.end_time - now_ms();
    (remaining >= 0).then(|| Duration::from_millis(remaining as u64 + 1))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, mut session: Session, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role: session.role,
        lang: session.lang,
        rtl: session.lang.is_rtl(),
        server_now: now_ms(),
    };
    if !send(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let mut subscription: Option<GameSubscription> = None;
    let mut last_game: Option<Game> = None;

    loop {
        // Follow the session's PIN (join, watch, create, PIN regeneration)
        if session.pin.as_deref() != subscription.as_ref().map(|s| s.pin()) {
            subscription = None;
            last_game = None;
            if let Some(pin) = session.pin.clone() {
                match state.store.subscribe(&pin).await {
                    Ok(sub) => subscription = Some(sub),
                    Err(e) => {
                        tracing::error!("Failed to subscribe to game {}: {}", pin, e);
                        session.pin = None;
                        if !send(&mut sender, &ServerMessage::error(&e, session.lang)).await {
                            break;
                        }
                    }
                }
            }
        }

        let deadline = admin_deadline(&session, last_game.as_ref());

        tokio::select! {
            update = async {
                match &mut subscription {
                    Some(sub) => sub.next().await,
                    // Nothing watched: wait forever
                    None => std::future::pending::<Option<Option<Game>>>().await,
                }
            } => {
                match update {
                    Some(Some(game)) => {
                        let msg = render(&mut session, &game);
                        last_game = Some(game);
                        if !send(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Some(None) => {
                        let pin = session.pin.take().unwrap_or_default();
                        session.player_id = None;
                        tracing::debug!("Watched game {} disappeared", pin);
                        if !send(&mut sender, &ServerMessage::GameClosed { pin }).await {
                            break;
                        }
                    }
                    None => {
                        let err = crate::error::GameError::StoreUnavailable;
                        let _ = send(&mut sender, &ServerMessage::error(&err, session.lang)).await;
                        break;
                    }
                }
            }

            _ = async {
                match deadline {
                    Some(wait) => tokio::time::sleep(wait).await,
                    None => std::future::pending::<()>().await,
                }
            } => {
                if let Some(game) = last_game.clone() {
                    let msg = render(&mut session, &game);
                    if !send(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            // Handle client messages
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if client_msg.is_admin_only() {
                                    tracing::info!(
                                        "Admin command on game {:?} from {:?} connection: {:?}",
                                        session.pin,
                                        session.role,
                                        client_msg
                                    );
                                }
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &mut session, &state).await
                                {
                                    if !send(&mut sender, &response).await {
                                        tracing::error!("Failed to send response");
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                let _ = send(&mut sender, &error).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", session.role);
}
