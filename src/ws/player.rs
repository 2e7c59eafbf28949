//! Player and spectator message handlers

use crate::error::{GameError, GameResult};
use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{is_valid_pin, Pin, Player, PlayerId, Role, RoundNumber, SentenceId};

use super::handlers::{respond, Session};

fn checked_pin(pin: Pin) -> GameResult<Pin> {
    let pin = pin.trim().to_string();
    if is_valid_pin(&pin) {
        Ok(pin)
    } else {
        Err(GameError::InvalidPin(pin))
    }
}

/// Follow a game without joining it
pub async fn handle_watch(state: &AppState, session: &mut Session, pin: Pin) -> Option<ServerMessage> {
    let result = match checked_pin(pin) {
        Ok(pin) => state.get_game(&pin).await.map(|_| pin),
        Err(e) => Err(e),
    };
    respond(session.lang, result, |pin| {
        tracing::debug!("Connection now watching game {}", pin);
        session.pin = Some(pin);
        if session.role == Role::Player {
            session.player_id = None;
        }
        None
    })
}

fn bind(session: &mut Session, player: Player, token: String) -> Option<ServerMessage> {
    session.pin = Some(player.game_pin.clone());
    session.player_id = Some(player.id.clone());
    Some(ServerMessage::Joined {
        pin: player.game_pin,
        player_id: player.id,
        name: player.name,
        token,
    })
}

pub async fn handle_join(
    state: &AppState,
    session: &mut Session,
    pin: Pin,
    name: String,
) -> Option<ServerMessage> {
    let result = match checked_pin(pin) {
        Ok(pin) => state.join_game(&pin, &name).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |player| {
        let token = player.token.clone();
        bind(session, player, token)
    })
}

pub async fn handle_rejoin(
    state: &AppState,
    session: &mut Session,
    pin: Pin,
    player_id: PlayerId,
    token: String,
) -> Option<ServerMessage> {
    let result = match checked_pin(pin) {
        Ok(pin) => state.rejoin(&pin, &player_id, &token).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |player| bind(session, player, token))
}

pub async fn handle_submit_answer(
    state: &AppState,
    session: &Session,
    round: RoundNumber,
    sentence_id: SentenceId,
    is_fake: bool,
) -> Option<ServerMessage> {
    let result = match session.require_player() {
        Ok((pin, player_id)) => {
            state
                .submit_answer(pin, player_id, round, &sentence_id, is_fake)
                .await
        }
        Err(e) => Err(e),
    };
    respond(session.lang, result, |_| {
        Some(ServerMessage::AnswerAck {
            round,
            sentence_id,
            is_fake,
        })
    })
}

pub async fn handle_set_ready(state: &AppState, session: &Session, ready: bool) -> Option<ServerMessage> {
    let result = match session.require_player() {
        Ok((pin, player_id)) => state.set_ready(pin, player_id, ready).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |_| Some(ServerMessage::ReadyAck { ready }))
}

pub async fn handle_leaderboard(state: &AppState, session: &Session) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => state.get_game(pin).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |game| {
        Some(ServerMessage::leaderboard(&game, session.lang))
    })
}
