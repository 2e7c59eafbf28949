use crate::error::{GameError, GameResult};
use crate::scoring::{self, PlayerScore};
use crate::state::AppState;
use crate::store::FieldPatch;
use crate::types::*;

impl AppState {
    /// Recompute one player's score from their answers and persist it
    pub async fn calculate_and_update_player_score(
        &self,
        pin: &str,
        player_id: &str,
    ) -> GameResult<u8> {
        let game = self.get_game(pin).await?;
        let player = game
            .players
            .get(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        let score = scoring::score_player(&game, player);

        self.store
            .merge_fields(
                pin,
                vec![FieldPatch::PlayerScore {
                    player_id: player_id.to_string(),
                    score,
                }],
            )
            .await?;
        tracing::debug!("Player {} in game {} scored {}", player_id, pin, score);
        Ok(score)
    }

    /// Rescore every player from the answers present at write time
    pub async fn recalculate_scores(&self, pin: &str) -> GameResult<()> {
        self.store.merge_fields(pin, vec![FieldPatch::ScoreAll]).await?;
        tracing::info!("Rescored players in game {}", pin);
        Ok(())
    }

    /// Ranked persisted scores with localized category labels
    pub async fn get_leaderboard(&self, pin: &str, lang: Language) -> GameResult<Vec<PlayerScore>> {
        let game = self.get_game(pin).await?;
        Ok(scoring::leaderboard(&game, lang))
    }
}
