use super::{now_ms, AppState};
use crate::error::GameResult;
use crate::machine::{self, AdvanceOutcome, AdvanceReport};
use crate::store::{FieldPatch, MergeOutcome, Precondition};
use crate::types::*;

impl AppState {
    /// Commit a planned transition unless the game moved since `game` was read
    async fn commit_transition(
        &self,
        game: &Game,
        to: GameStatus,
        patches: Vec<FieldPatch>,
    ) -> GameResult<AdvanceReport> {
        let from = game.status;
        match self
            .store
            .merge_fields_if(&game.pin, Precondition::of(game), patches)
            .await?
        {
            MergeOutcome::Applied => {
                tracing::info!("Game {} advanced {:?} -> {:?}", game.pin, from, to);
                Ok(AdvanceReport {
                    from,
                    to,
                    outcome: AdvanceOutcome::Advanced,
                })
            }
            MergeOutcome::PreconditionFailed { status, .. } => {
                tracing::debug!(
                    "Game {} already left {:?} (now {:?}), advance is a no-op",
                    game.pin,
                    from,
                    status
                );
                Ok(AdvanceReport {
                    from,
                    to: status,
                    outcome: AdvanceOutcome::AlreadyAdvanced,
                })
            }
        }
    }

    /// lobby -> round1
    pub async fn start_game(&self, pin: &str) -> GameResult<AdvanceReport> {
        let game = self.get_game(pin).await?;
        let patches = self.with_rng(|rng| machine::plan_start(&game, rng, now_ms()))??;
        self.commit_transition(&game, GameStatus::Round1, patches)
            .await
    }

    /// Move one step forward from `from` (or from wherever the game is).
    ///
    /// Safe to call redundantly: when the game is no longer in `from`, or
    /// another caller commits first, nothing is written and the outcome is
    /// `AlreadyAdvanced`.
    pub async fn advance(&self, pin: &str, from: Option<GameStatus>) -> GameResult<AdvanceReport> {
        let game = self.get_game(pin).await?;
        if let Some(expected) = from {
            if expected != game.status {
                tracing::debug!(
                    "Game {} is in {:?}, ignoring advance from {:?}",
                    pin,
                    game.status,
                    expected
                );
                return Ok(AdvanceReport {
                    from: expected,
                    to: game.status,
                    outcome: AdvanceOutcome::AlreadyAdvanced,
                });
            }
        }

        let patches = self.with_rng(|rng| machine::plan_advance(&game, rng, now_ms()))??;
        let to = machine::next_status(game.status).unwrap_or(game.status);
        self.commit_transition(&game, to, patches).await
    }

    /// Advance when a trigger fired (deadline, everyone ready, everyone answered)
    pub async fn advance_if_due(&self, pin: &str, now: i64) -> GameResult<Option<AdvanceReport>> {
        let game = self.get_game(pin).await?;
        if !machine::advance_triggers(&game, now).any() {
            return Ok(None);
        }
        self.advance(pin, Some(game.status)).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::state::tests::seeded_state;
    use std::collections::HashSet;

    async fn game_with_players(state: &AppState, names: &[&str]) -> Game {
        let game = state.create_game("admin".to_string()).await.unwrap();
        for name in names {
            state.join_game(&game.pin, name).await.unwrap();
        }
        state.get_game(&game.pin).await.unwrap()
    }

    #[tokio::test]
    async fn test_start_game() {
        let state = seeded_state(1);
        let game = game_with_players(&state, &["Alice"]).await;

        let report = state.start_game(&game.pin).await.unwrap();
        assert_eq!(report.outcome, AdvanceOutcome::Advanced);
        assert_eq!(report.to, GameStatus::Round1);

        let game = state.get_game(&game.pin).await.unwrap();
        assert_eq!(game.status, GameStatus::Round1);
        assert_eq!(game.current_round, Some(1));
        assert_eq!(game.rounds[&1].sentences.len(), ROUND_SIZE);
    }

    #[tokio::test]
    async fn test_kick_between_planning_and_commit() {
        let state = seeded_state(12);
        let game = game_with_players(&state, &["Alice", "Bob"]).await;
        state.start_game(&game.pin).await.unwrap();

        let stale = state.get_game(&game.pin).await.unwrap();
        let patches = state
            .with_rng(|rng| machine::plan_advance(&stale, rng, now_ms()))
            .unwrap()
            .unwrap();
        let bob = stale.players.values().find(|p| p.name == "Bob").unwrap();
        state.kick_player(&game.pin, &bob.id).await.unwrap();

        let outcome = state
            .store
            .merge_fields_if(&game.pin, Precondition::of(&stale), patches)
            .await
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Applied);
        let game = state.get_game(&game.pin).await.unwrap();
        assert_eq!(game.status, GameStatus::Round2);
        assert_eq!(game.players.len(), 1);
    }

    #[tokio::test]
    async fn test_answer_between_planning_and_commit_is_scored() {
        let state = seeded_state(13);
        let game = game_with_players(&state, &["Alice"]).await;
        let alice = game.players.values().next().unwrap().id.clone();
        state.start_game(&game.pin).await.unwrap();
        state.advance(&game.pin, None).await.unwrap();

        let stale = state.get_game(&game.pin).await.unwrap();
        let patches = state
            .with_rng(|rng| machine::plan_advance(&stale, rng, now_ms()))
            .unwrap()
            .unwrap();
        for sentence in &stale.rounds[&2].sentences {
            state
                .submit_answer(&game.pin, &alice, 2, &sentence.id, sentence.is_fake)
                .await
                .unwrap();
        }

        state
            .store
            .merge_fields_if(&game.pin, Precondition::of(&stale), patches)
            .await
            .unwrap();
        let game = state.get_game(&game.pin).await.unwrap();
        assert_eq!(game.status, GameStatus::Round3);
        assert_eq!(game.players[&alice].score, 100);
    }

    #[tokio::test]
    async fn test_start_without_players() {
        let state = seeded_state(1);
        let game = game_with_players(&state, &[]).await;
        assert_eq!(state.start_game(&game.pin).await, Err(GameError::NoPlayers));
        assert_eq!(
            state.get_game(&game.pin).await.unwrap().status,
            GameStatus::Lobby
        );
    }

    #[tokio::test]
    async fn test_double_advance_generates_round3_once() {
        let state = seeded_state(8);
        let game = game_with_players(&state, &["Alice", "Bob"]).await;
        state.start_game(&game.pin).await.unwrap();
        state.advance(&game.pin, Some(GameStatus::Round1)).await.unwrap();

        let first = state
            .advance(&game.pin, Some(GameStatus::Round2))
            .await
            .unwrap();
        let round3 = state.get_game(&game.pin).await.unwrap().rounds[&3].clone();
        let second = state
            .advance(&game.pin, Some(GameStatus::Round2))
            .await
            .unwrap();

        assert_eq!(first.outcome, AdvanceOutcome::Advanced);
        assert_eq!(second.outcome, AdvanceOutcome::AlreadyAdvanced);
        assert_eq!(second.to, GameStatus::Round3);

        let game = state.get_game(&game.pin).await.unwrap();
        assert_eq!(game.status, GameStatus::Round3);
        assert_eq!(game.rounds[&3], round3);
    }

    #[tokio::test]
    async fn test_concurrent_advances_commit_once() {
        let state = seeded_state(21);
        let game = game_with_players(&state, &["Alice"]).await;
        state.start_game(&game.pin).await.unwrap();
        state.advance(&game.pin, None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let state = state.clone();
            let pin = game.pin.clone();
            handles.push(tokio::spawn(async move {
                state.advance(&pin, Some(GameStatus::Round2)).await
            }));
        }

        let mut advanced = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().outcome == AdvanceOutcome::Advanced {
                advanced += 1;
            }
        }
        assert_eq!(advanced, 1);
        assert_eq!(
            state.get_game(&game.pin).await.unwrap().status,
            GameStatus::Round3
        );
    }

    #[tokio::test]
    async fn test_advance_from_results_is_invalid() {
        let state = seeded_state(2);
        let game = game_with_players(&state, &["Alice"]).await;
        state.start_game(&game.pin).await.unwrap();
        state.stop_game(&game.pin).await.unwrap();

        assert!(matches!(
            state.advance(&game.pin, None).await,
            Err(GameError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_round2_new_sentences_not_from_round1() {
        let state = seeded_state(13);
        let game = game_with_players(&state, &["Alice"]).await;
        state.start_game(&game.pin).await.unwrap();
        state.advance(&game.pin, None).await.unwrap();

        let game = state.get_game(&game.pin).await.unwrap();
        let round1: HashSet<_> = game.rounds[&1].sentences.iter().map(|s| &s.id).collect();
        let repeated = game.rounds[&2]
            .sentences
            .iter()
            .filter(|s| round1.contains(&s.id))
            .count();
        assert_eq!(repeated, 4);
    }

    #[tokio::test]
    async fn test_advance_if_due_waits_for_trigger() {
        let state = seeded_state(6);
        let game = game_with_players(&state, &["Alice"]).await;
        state.start_game(&game.pin).await.unwrap();
        let started = state.get_game(&game.pin).await.unwrap();
        let round1 = &started.rounds[&1];

        assert!(state
            .advance_if_due(&game.pin, round1.start_time)
            .await
            .unwrap()
            .is_none());

        let report = state
            .advance_if_due(&game.pin, round1.end_time)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.to, GameStatus::Round2);
    }
}
