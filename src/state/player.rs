use super::{now_ms, AppState};
use crate::error::{GameError, GameResult};
use crate::store::{FieldPatch, FieldPath, MergeOutcome, Precondition};
use crate::types::*;

/// Longest display name kept; the rest is cut off
const MAX_NAME_CHARS: usize = 24;

/// Trimmed and shortened name, or a generated one when blank
fn display_name(raw: &str) -> String {
    let trimmed: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    if !trimmed.is_empty() {
        return trimmed;
    }
    petname::petname(2, "-").unwrap_or_else(|| "player".to_string())
}

const LOBBY: Precondition = Precondition {
    status: GameStatus::Lobby,
    current_round: None,
};

impl AppState {
    /// Add a player to a game that has not started yet
    pub async fn join_game(&self, pin: &str, name: &str) -> GameResult<Player> {
        let game = self.get_game(pin).await?;
        if game.status != GameStatus::Lobby {
            return Err(GameError::JoinClosed);
        }

        let player = Player {
            id: ulid::Ulid::new().to_string(),
            name: display_name(name),
            game_pin: pin.to_string(),
            score: 0,
            answers: AnswerMap::new(),
            joined_at: now_ms(),
            round1_ready: false,
            kicked: false,
            token: ulid::Ulid::new().to_string(),
        };

        match self
            .store
            .merge_fields_if(pin, LOBBY, vec![FieldPatch::Player(player.clone())])
            .await?
        {
            MergeOutcome::Applied => {
                tracing::info!("Player {} ({}) joined game {}", player.name, player.id, pin);
                Ok(player)
            }
            MergeOutcome::PreconditionFailed { .. } => Err(GameError::JoinClosed),
        }
    }

    /// Re-attach a reconnecting client to its player
    pub async fn rejoin(&self, pin: &str, player_id: &str, token: &str) -> GameResult<Player> {
        let game = self.get_game(pin).await?;
        let player = game
            .player_by_token(player_id, token)
            .cloned()
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        tracing::debug!("Player {} rejoined game {}", player_id, pin);
        Ok(player)
    }

    /// Record one "is this fake?" answer for the open round
    pub async fn submit_answer(
        &self,
        pin: &str,
        player_id: &str,
        round: RoundNumber,
        sentence_id: &str,
        is_fake: bool,
    ) -> GameResult<()> {
        let game = self.get_game(pin).await?;
        if round < 2 {
            return Err(GameError::InvalidAnswer(format!(
                "round {} takes no answers",
                round
            )));
        }
        if game.status.round_number() != Some(round) {
            return Err(GameError::InvalidAnswer(format!("round {} is not open", round)));
        }
        let round_data = game
            .rounds
            .get(&round)
            .ok_or(GameError::RoundDataMissing(round))?;
        if round_data.sentence(sentence_id).is_none() {
            return Err(GameError::InvalidAnswer(format!(
                "sentence {} is not part of round {}",
                sentence_id, round
            )));
        }
        if !game.players.contains_key(player_id) {
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        }

        let patch = FieldPatch::PlayerAnswer {
            player_id: player_id.to_string(),
            round,
            sentence_id: sentence_id.to_string(),
            answer: is_fake,
        };
        match self
            .store
            .merge_fields_if(pin, Precondition::of(&game), vec![patch])
            .await?
        {
            MergeOutcome::Applied => {
                tracing::debug!(
                    "Player {} answered {} in round {} of game {}",
                    player_id,
                    sentence_id,
                    round,
                    pin
                );
                Ok(())
            }
            MergeOutcome::PreconditionFailed { .. } => Err(GameError::InvalidAnswer(format!(
                "round {} closed before the answer arrived",
                round
            ))),
        }
    }

    /// Round 1 acknowledgment
    pub async fn set_ready(&self, pin: &str, player_id: &str, ready: bool) -> GameResult<()> {
        let game = self.get_game(pin).await?;
        if game.status != GameStatus::Round1 {
            return Err(GameError::NotInRound1);
        }

        let precondition = Precondition {
            status: GameStatus::Round1,
            current_round: Some(1),
        };
        let patch = FieldPatch::PlayerReady {
            player_id: player_id.to_string(),
            ready,
        };
        match self
            .store
            .merge_fields_if(pin, precondition, vec![patch])
            .await?
        {
            MergeOutcome::Applied => Ok(()),
            MergeOutcome::PreconditionFailed { .. } => Err(GameError::NotInRound1),
        }
    }

    /// Remove a player; kicking someone already gone is a no-op
    pub async fn kick_player(&self, pin: &str, player_id: &str) -> GameResult<()> {
        self.store
            .delete_field(pin, FieldPath::Player(player_id.to_string()))
            .await?;
        tracing::info!("Player {} removed from game {}", player_id, pin);
        Ok(())
    }
}
