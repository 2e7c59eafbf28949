//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! Authorization is checked here, then dispatched to role-specific handler modules.

use crate::error::{GameError, GameResult};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{Language, Pin, PlayerId, Role};

use super::{admin, player};

/// Per-connection state
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub role: Role,
    pub lang: Language,
    /// Game this connection follows
    pub pin: Option<Pin>,
    /// Player this connection acts as
    pub player_id: Option<PlayerId>,
}

impl Session {
    pub fn new(role: Role, lang: Language) -> Self {
        Self {
            role,
            lang,
            pin: None,
            player_id: None,
        }
    }

    pub fn require_pin(&self) -> GameResult<&str> {
        self.pin
            .as_deref()
            .ok_or_else(|| GameError::GameNotFound(String::new()))
    }

    /// `(pin, player_id)` of the bound player
    pub fn require_player(&self) -> GameResult<(&str, &str)> {
        let pin = self.require_pin()?;
        let player_id = self
            .player_id
            .as_deref()
            .ok_or_else(|| GameError::PlayerNotFound(String::new()))?;
        Ok((pin, player_id))
    }
}

/// Turn a result into the reply for the client; errors become localized
/// `error` messages
pub(super) fn respond<T>(
    lang: Language,
    result: GameResult<T>,
    on_ok: impl FnOnce(T) -> Option<ServerMessage>,
) -> Option<ServerMessage> {
    match result {
        Ok(value) => on_ok(value),
        Err(e) => {
            match &e {
                GameError::StoreUnavailable | GameError::PoolExhausted { .. } => {
                    tracing::error!("Request failed: {}", e)
                }
                _ => tracing::debug!("Request rejected: {}", e),
            }
            Some(ServerMessage::error(&e, lang))
        }
    }
}

/// Macro to check admin authorization and return early if unauthorized
macro_rules! check_admin {
    ($session:expr, $action:expr) => {
        if $session.role != Role::Admin {
            tracing::warn!("Non-admin connection tried to {}", $action);
            return Some(ServerMessage::error(&GameError::Unauthorized, $session.lang));
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    session: &mut Session,
    state: &AppState,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Watch { pin } => player::handle_watch(state, session, pin).await,

        ClientMessage::SetLanguage { lang } => {
            session.lang = lang;
            Some(ServerMessage::Welcome {
                protocol: crate::protocol::PROTOCOL_VERSION.to_string(),
                role: session.role,
                lang,
                rtl: lang.is_rtl(),
                server_now: crate::state::now_ms(),
            })
        }

        ClientMessage::RequestLeaderboard => player::handle_leaderboard(state, session).await,

        // Player messages
        ClientMessage::JoinGame { pin, name } => {
            player::handle_join(state, session, pin, name).await
        }

        ClientMessage::Rejoin {
            pin,
            player_id,
            token,
        } => player::handle_rejoin(state, session, pin, player_id, token).await,

        ClientMessage::SubmitAnswer {
            round,
            sentence_id,
            is_fake,
        } => player::handle_submit_answer(state, session, round, sentence_id, is_fake).await,

        ClientMessage::SetReady { ready } => player::handle_set_ready(state, session, ready).await,

        // Admin-only commands (authorization checked before dispatch)
        ClientMessage::AdminCreateGame => {
            check_admin!(session, "create games");
            admin::handle_create_game(state, session).await
        }

        ClientMessage::AdminStartGame => {
            check_admin!(session, "start games");
            admin::handle_start_game(state, session).await
        }

        ClientMessage::AdminAdvance { from } => {
            check_admin!(session, "advance rounds");
            admin::handle_advance(state, session, from).await
        }

        ClientMessage::AdminStopGame => {
            check_admin!(session, "stop games");
            admin::handle_stop_game(state, session).await
        }

        ClientMessage::AdminRestartGame => {
            check_admin!(session, "restart games");
            admin::handle_restart_game(state, session).await
        }

        ClientMessage::AdminRegeneratePin => {
            check_admin!(session, "regenerate PINs");
            admin::handle_regenerate_pin(state, session).await
        }

        ClientMessage::AdminKickPlayer { player_id } => {
            check_admin!(session, "kick players");
            admin::handle_kick_player(state, session, player_id).await
        }

        ClientMessage::AdminRecalculateScores => {
            check_admin!(session, "recalculate scores");
            admin::handle_recalculate_scores(state, session).await
        }
    }
}
