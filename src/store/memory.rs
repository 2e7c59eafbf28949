use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{watch, RwLock};

use super::{
    apply_patches, remove_path, FieldPatch, FieldPath, GameStore, GameSubscription, MergeOutcome,
    Precondition,
};
use crate::error::{GameError, GameResult};
use crate::types::{Game, Pin};

/// In-process store: one map of aggregates plus one watch channel per PIN.
///
/// Lock order is `games` then `channels`. Writers publish while still holding
/// the `games` write lock, so subscribers observe changes in commit order.
pub struct MemoryStore {
    games: RwLock<HashMap<Pin, Game>>,
    channels: Mutex<HashMap<Pin, watch::Sender<Option<Game>>>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    fn ensure_available(&self) -> GameResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GameError::StoreUnavailable)
        }
    }

    fn channels(&self) -> GameResult<std::sync::MutexGuard<'_, HashMap<Pin, watch::Sender<Option<Game>>>>> {
        self.channels.lock().map_err(|_| {
            tracing::error!("Subscription registry lock poisoned");
            GameError::StoreUnavailable
        })
    }

    /// Push `value` to subscribers of `pin`, dropping channels nobody listens to
    fn publish(&self, pin: &str, value: Option<Game>) -> GameResult<()> {
        let mut channels = self.channels()?;
        if let Some(tx) = channels.get(pin) {
            tx.send_replace(value);
            if tx.receiver_count() == 0 {
                channels.remove(pin);
            }
        }
        Ok(())
    }

    async fn merge_inner(
        &self,
        pin: &str,
        precondition: Option<Precondition>,
        patches: &[FieldPatch],
    ) -> GameResult<MergeOutcome> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        let current = games
            .get(pin)
            .ok_or_else(|| GameError::GameNotFound(pin.to_string()))?;

        if let Some(pre) = precondition {
            if !pre.matches(current) {
                return Ok(MergeOutcome::PreconditionFailed {
                    status: current.status,
                    current_round: current.current_round,
                });
            }
        }

        let next = apply_patches(current, patches)?;
        games.insert(pin.to_string(), next.clone());
        self.publish(pin, Some(next))?;
        Ok(MergeOutcome::Applied)
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn put(&self, pin: &str, game: Game) -> GameResult<()> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        games.insert(pin.to_string(), game.clone());
        self.publish(pin, Some(game))
    }

    async fn get(&self, pin: &str) -> GameResult<Option<Game>> {
        self.ensure_available()?;
        Ok(self.games.read().await.get(pin).cloned())
    }

    async fn subscribe(&self, pin: &str) -> GameResult<GameSubscription> {
        self.ensure_available()?;
        // Holding the read lock keeps writers from publishing between the
        // snapshot and the registration.
        let games = self.games.read().await;
        let mut channels = self.channels()?;
        let rx = match channels.get(pin) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = watch::channel(games.get(pin).cloned());
                channels.insert(pin.to_string(), tx);
                rx
            }
        };
        Ok(GameSubscription::new(pin.to_string(), rx))
    }

    async fn merge_fields(&self, pin: &str, patches: Vec<FieldPatch>) -> GameResult<()> {
        self.merge_inner(pin, None, &patches).await.map(|_| ())
    }

    async fn merge_fields_if(
        &self,
        pin: &str,
        precondition: Precondition,
        patches: Vec<FieldPatch>,
    ) -> GameResult<MergeOutcome> {
        self.merge_inner(pin, Some(precondition), &patches).await
    }

    async fn delete_field(&self, pin: &str, path: FieldPath) -> GameResult<()> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        let game = games
            .get_mut(pin)
            .ok_or_else(|| GameError::GameNotFound(pin.to_string()))?;
        remove_path(game, &path);
        let snapshot = game.clone();
        self.publish(pin, Some(snapshot))
    }

    async fn delete(&self, pin: &str) -> GameResult<()> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        if games.remove(pin).is_some() {
            self.publish(pin, None)?;
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> GameResult<bool> {
        self.ensure_available()?;
        let mut games = self.games.write().await;
        if games.contains_key(to) {
            return Ok(false);
        }
        let mut game = games
            .remove(from)
            .ok_or_else(|| GameError::GameNotFound(from.to_string()))?;
        game.id = to.to_string();
        game.pin = to.to_string();
        for player in game.players.values_mut() {
            player.game_pin = to.to_string();
        }
        games.insert(to.to_string(), game.clone());
        self.publish(to, Some(game))?;
        self.publish(from, None)?;
        Ok(true)
    }

    async fn pins(&self) -> GameResult<Vec<String>> {
        self.ensure_available()?;
        let mut pins: Vec<String> = self.games.read().await.keys().cloned().collect();
        pins.sort();
        Ok(pins)
    }

    async fn shutdown(&self) {
        self.available.store(false, Ordering::SeqCst);
        let _games = self.games.write().await;
        if let Ok(mut channels) = self.channels.lock() {
            // Dropping the senders ends every subscription
            channels.clear();
        }
        tracing::info!("Game store shut down");
    }
}
