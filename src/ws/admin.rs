//! Admin message handlers

use crate::protocol::ServerMessage;
use crate::state::AppState;
use crate::types::{GameStatus, PlayerId};

use super::handlers::{respond, Session};

pub async fn handle_create_game(state: &AppState, session: &mut Session) -> Option<ServerMessage> {
    let result = state.create_game(state.auth.admin_id()).await;
    respond(session.lang, result.map(|game| game.pin), |pin| {
        session.pin = Some(pin.clone());
        Some(ServerMessage::GameCreated { pin })
    })
}

fn advanced(report: crate::state::AdvanceReport) -> Option<ServerMessage> {
    Some(ServerMessage::Advanced {
        from: report.from,
        to: report.to,
        outcome: report.outcome,
    })
}

pub async fn handle_start_game(state: &AppState, session: &Session) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => state.start_game(pin).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, advanced)
}

pub async fn handle_advance(
    state: &AppState,
    session: &Session,
    from: Option<GameStatus>,
) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => state.advance(pin, from).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, advanced)
}

pub async fn handle_stop_game(state: &AppState, session: &Session) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => state.stop_game(pin).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |_| None)
}

pub async fn handle_restart_game(state: &AppState, session: &Session) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => state.restart_game(pin).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |_| None)
}

pub async fn handle_regenerate_pin(
    state: &AppState,
    session: &mut Session,
) -> Option<ServerMessage> {
    let old_pin = match session.require_pin() {
        Ok(pin) => pin.to_string(),
        Err(e) => return respond(session.lang, Err::<(), _>(e), |_| None),
    };
    let result = state.regenerate_pin(&old_pin).await;
    respond(session.lang, result, |new_pin| {
        session.pin = Some(new_pin.clone());
        Some(ServerMessage::PinChanged { old_pin, new_pin })
    })
}

pub async fn handle_kick_player(
    state: &AppState,
    session: &Session,
    player_id: PlayerId,
) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => state.kick_player(pin, &player_id).await,
        Err(e) => Err(e),
    };
    respond(session.lang, result, |_| None)
}

pub async fn handle_recalculate_scores(
    state: &AppState,
    session: &Session,
) -> Option<ServerMessage> {
    let result = match session.require_pin() {
        Ok(pin) => match state.recalculate_scores(pin).await {
            Ok(()) => state.get_game(pin).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    respond(session.lang, result, |game| {
        Some(ServerMessage::leaderboard(&game, session.lang))
    })
}
