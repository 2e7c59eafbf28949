use rand::Rng;

use super::{now_ms, AppState};
use crate::error::{GameError, GameResult};
use crate::machine;
use crate::store::{MergeOutcome, Precondition};
use crate::types::*;

/// PINs are uniform in this range
const PIN_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;
/// Give up after this many colliding PINs in a row
const MAX_PIN_ATTEMPTS: usize = 32;
/// Restart re-reads the game this often if it keeps moving underneath
const MAX_RESTART_ATTEMPTS: usize = 5;

impl AppState {
    /// A PIN no live game is using
    async fn unused_pin(&self) -> GameResult<Pin> {
        for _ in 0..MAX_PIN_ATTEMPTS {
            let pin = self.with_rng(|rng| rng.random_range(PIN_RANGE))?.to_string();
            if self.store.get(&pin).await?.is_none() {
                return Ok(pin);
            }
            tracing::debug!("PIN {} is taken, drawing another", pin);
        }
        tracing::error!("No free PIN after {} attempts", MAX_PIN_ATTEMPTS);
        Err(GameError::StoreUnavailable)
    }

    /// Create a new game in the lobby
    pub async fn create_game(&self, admin_id: AdminId) -> GameResult<Game> {
        let pin = self.unused_pin().await?;
        let game = Game::new(pin.clone(), admin_id, now_ms());
        self.store.put(&pin, game.clone()).await?;
        tracing::info!("Game {} created by {}", pin, game.admin_id);
        Ok(game)
    }

    /// Move a game to a fresh PIN. Clients watching the old PIN see it vanish.
    ///
    /// The move is a single store operation, so writes racing it either land
    /// before the move and travel along, or fail with `GameNotFound`.
    pub async fn regenerate_pin(&self, old_pin: &str) -> GameResult<Pin> {
        for _ in 0..MAX_PIN_ATTEMPTS {
            let new_pin = self.unused_pin().await?;
            if self.store.rename(old_pin, &new_pin).await? {
                tracing::info!("Game {} moved to PIN {}", old_pin, new_pin);
                return Ok(new_pin);
            }
            tracing::debug!("PIN {} was taken before the move, drawing another", new_pin);
        }
        tracing::error!("Could not move game {} to a free PIN", old_pin);
        Err(GameError::StoreUnavailable)
    }

    /// Back to the lobby with the same roster and no progress
    pub async fn restart_game(&self, pin: &str) -> GameResult<()> {
        for _ in 0..MAX_RESTART_ATTEMPTS {
            let game = self.get_game(pin).await?;
            let outcome = self
                .store
                .merge_fields_if(pin, Precondition::of(&game), machine::plan_restart(&game)?)
                .await?;
            if outcome == MergeOutcome::Applied {
                tracing::info!("Game {} restarted", pin);
                return Ok(());
            }
        }
        tracing::warn!("Game {} kept changing during restart", pin);
        Err(GameError::InvalidTransition {
            action: "restart",
            status: self.get_game(pin).await?.status,
        })
    }

    /// Jump straight to results without scoring again
    pub async fn stop_game(&self, pin: &str) -> GameResult<()> {
        self.store.merge_fields(pin, machine::plan_stop()).await?;
        tracing::info!("Game {} stopped", pin);
        Ok(())
    }
}
