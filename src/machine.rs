//! Game status progression.
//!
//! Everything here is pure: given a snapshot of the aggregate it decides
//! whether a transition is legal and which field patches it writes. The
//! `state` module commits those patches with a conditional merge, so a plan
//! built from a stale snapshot is discarded instead of applied twice.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};
use crate::rounds::{self, create_game_round};
use crate::store::FieldPatch;
use crate::types::{Game, GameRound, GameStatus, RoundNumber};

/// Whether an advance request moved the game or found it already moved
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced,
    AlreadyAdvanced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvanceReport {
    pub from: GameStatus,
    /// Status after the call; for `AlreadyAdvanced` the status observed
    pub to: GameStatus,
    pub outcome: AdvanceOutcome,
}

/// Status reached by advancing from `from`. Lobby starts instead of
/// advancing and results is terminal.
pub fn next_status(from: GameStatus) -> Option<GameStatus> {
    match from {
        GameStatus::Round1 => Some(GameStatus::Round2),
        GameStatus::Round2 => Some(GameStatus::Round3),
        GameStatus::Round3 => Some(GameStatus::Results),
        GameStatus::Lobby | GameStatus::Results => None,
    }
}

/// Conditions that make an advance due. Any one of them is enough; an
/// explicit admin request is always allowed on top of these.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvanceTriggers {
    pub deadline_passed: bool,
    /// Round 1: every player flagged ready
    pub all_ready: bool,
    /// Rounds 2 and 3: every player answered every sentence
    pub all_answered: bool,
}

impl AdvanceTriggers {
    pub fn any(&self) -> bool {
        self.deadline_passed || self.all_ready || self.all_answered
    }
}

pub fn advance_triggers(game: &Game, now_ms: i64) -> AdvanceTriggers {
    let Some(round) = game.current_round_data().filter(|_| game.status.is_round()) else {
        return AdvanceTriggers::default();
    };

    let mut players = game.active_players().peekable();
    let has_players = players.peek().is_some();
    let (all_ready, all_answered) = match game.status {
        GameStatus::Round1 => (has_players && players.all(|p| p.round1_ready), false),
        _ => (false, has_players && players.all(|p| p.has_answered_all(round))),
    };

    AdvanceTriggers {
        deadline_passed: round.is_expired(now_ms),
        all_ready,
        all_answered,
    }
}

fn round_data(game: &Game, n: RoundNumber) -> GameResult<&GameRound> {
    game.rounds.get(&n).ok_or(GameError::RoundDataMissing(n))
}

/// lobby -> round1
pub fn plan_start<R: Rng + ?Sized>(
    game: &Game,
    rng: &mut R,
    now_ms: i64,
) -> GameResult<Vec<FieldPatch>> {
    if game.status != GameStatus::Lobby {
        return Err(GameError::InvalidTransition {
            action: "start",
            status: game.status,
        });
    }
    if game.active_players().next().is_none() {
        return Err(GameError::NoPlayers);
    }

    let sentences = rounds::generate_round1(rng)?;
    Ok(vec![
        FieldPatch::Round(create_game_round(1, sentences, None, now_ms)),
        FieldPatch::CurrentRound(Some(1)),
        FieldPatch::Status(GameStatus::Round1),
    ])
}

/// One step along round1 -> round2 -> round3 -> results
pub fn plan_advance<R: Rng + ?Sized>(
    game: &Game,
    rng: &mut R,
    now_ms: i64,
) -> GameResult<Vec<FieldPatch>> {
    let (Some(to), Some(from_round)) = (next_status(game.status), game.status.round_number())
    else {
        return Err(GameError::InvalidTransition {
            action: "advance",
            status: game.status,
        });
    };
    let current = round_data(game, from_round)?;

    let mut patches = Vec::new();
    match to {
        GameStatus::Round2 => {
            let sentences = rounds::generate_round2(rng, &current.sentences)?;
            patches.push(FieldPatch::Round(create_game_round(
                2,
                sentences,
                Some(current),
                now_ms,
            )));
            patches.push(FieldPatch::CurrentRound(Some(2)));
            patches.push(FieldPatch::ClearReadyFlags);
        }
        GameStatus::Round3 => {
            // Scored before round 3 exists, so its unanswered sentences don't count
            patches.push(FieldPatch::ScoreAll);
            let earlier = game
                .rounds
                .get(&1)
                .map(|r| r.sentences.as_slice())
                .unwrap_or_default();
            let draw = rounds::generate_round3(rng, &current.sentences, earlier)?;
            let mut round = create_game_round(3, draw.sentences, Some(current), now_ms);
            round.rephrased = draw.rephrased;
            patches.push(FieldPatch::Round(round));
            patches.push(FieldPatch::CurrentRound(Some(3)));
        }
        _ => patches.push(FieldPatch::ScoreAll),
    }
    patches.push(FieldPatch::Status(to));
    Ok(patches)
}

/// Back to the lobby, wiping progress but keeping the roster
pub fn plan_restart(game: &Game) -> GameResult<Vec<FieldPatch>> {
    if game.status == GameStatus::Lobby {
        return Err(GameError::InvalidTransition {
            action: "restart",
            status: game.status,
        });
    }
    Ok(vec![
        FieldPatch::ClearRounds,
        FieldPatch::CurrentRound(None),
        FieldPatch::Status(GameStatus::Lobby),
        FieldPatch::ResetAllProgress,
    ])
}

/// Any status -> results, keeping all data and the last scoring pass
pub fn plan_stop() -> Vec<FieldPatch> {
    vec![FieldPatch::Status(GameStatus::Results)]
}

/// Structural invariants of an aggregate, used when importing snapshots
pub fn check_invariants(game: &Game) -> Result<(), String> {
    if game.id != game.pin {
        return Err(format!("game id {} differs from pin {}", game.id, game.pin));
    }
    match (game.status, game.current_round) {
        (GameStatus::Lobby, Some(n)) => {
            return Err(format!("lobby game has current round {}", n));
        }
        (status, current) if status.is_round() && current != status.round_number() => {
            return Err(format!(
                "status {:?} does not match current round {:?}",
                status, current
            ));
        }
        _ => {}
    }
    let newest = game.current_round.unwrap_or(0);
    if let Some(n) = game.rounds.keys().find(|n| **n > newest) {
        return Err(format!("round {} exists beyond current round {}", n, newest));
    }
    for (n, round) in &game.rounds {
        if round.round_number != *n {
            return Err(format!("round stored under {} claims number {}", n, round.round_number));
        }
    }
    for (id, player) in &game.players {
        if player.id != *id || player.game_pin != game.pin {
            return Err(format!("player {} is filed under the wrong key", id));
        }
        if player.score > 100 {
            return Err(format!("player {} has score {}", id, player.score));
        }
    }
    Ok(())
}
