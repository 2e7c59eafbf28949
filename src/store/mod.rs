//! Document store for game aggregates.
//!
//! The store holds one [`Game`] per PIN and pushes every change to subscribers.
//! Writes are field-scoped merges applied atomically per document, so actors
//! writing disjoint fields (different players, different sentences) never
//! clobber each other.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::{GameError, GameResult};
use crate::scoring;
use crate::types::{Game, GameRound, GameStatus, PlayerId, Player, RoundNumber, SentenceId};

/// A single field-scoped write into an aggregate
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    Status(GameStatus),
    CurrentRound(Option<RoundNumber>),
    /// Writes `rounds.{round.round_number}`
    Round(GameRound),
    ClearRounds,
    /// Writes `players.{player.id}` as a whole (join)
    Player(Player),
    PlayerScore {
        player_id: PlayerId,
        score: u8,
    },
    PlayerAnswer {
        player_id: PlayerId,
        round: RoundNumber,
        sentence_id: SentenceId,
        answer: bool,
    },
    PlayerReady {
        player_id: PlayerId,
        ready: bool,
    },
    /// Every player still in the game: score = 0, answers = {}, round1Ready = false
    ResetAllProgress,
    /// Every player still in the game: round1Ready = false
    ClearReadyFlags,
    /// Rescore every player still in the game from the rounds present when
    /// the patch applies
    ScoreAll,
}

/// Paths that can be removed from an aggregate
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPath {
    CurrentRound,
    Round(RoundNumber),
    Player(PlayerId),
}

/// Expected state for a conditional merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precondition {
    pub status: GameStatus,
    pub current_round: Option<RoundNumber>,
}

impl Precondition {
    pub fn of(game: &Game) -> Self {
        Self {
            status: game.status,
            current_round: game.current_round,
        }
    }

    pub fn matches(&self, game: &Game) -> bool {
        game.status == self.status && game.current_round == self.current_round
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// Nothing was written; the aggregate had already moved on
    PreconditionFailed {
        status: GameStatus,
        current_round: Option<RoundNumber>,
    },
}

fn player_mut<'a>(game: &'a mut Game, player_id: &str) -> GameResult<&'a mut Player> {
    game.players
        .get_mut(player_id)
        .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))
}

/// Apply one patch in place. A patch addressing a missing player fails
/// instead of creating a partial player; roster-wide patches only touch the
/// players present at apply time.
pub fn apply_patch(game: &mut Game, patch: &FieldPatch) -> GameResult<()> {
    match patch {
        FieldPatch::Status(status) => game.status = *status,
        FieldPatch::CurrentRound(round) => game.current_round = *round,
        FieldPatch::Round(round) => {
            game.rounds.insert(round.round_number, round.clone());
        }
        FieldPatch::ClearRounds => game.rounds.clear(),
        FieldPatch::Player(player) => {
            game.players.insert(player.id.clone(), player.clone());
        }
        FieldPatch::PlayerScore { player_id, score } => {
            player_mut(game, player_id)?.score = *score;
        }
        FieldPatch::PlayerAnswer {
            player_id,
            round,
            sentence_id,
            answer,
        } => {
            player_mut(game, player_id)?
                .answers
                .entry(*round)
                .or_default()
                .insert(sentence_id.clone(), *answer);
        }
        FieldPatch::PlayerReady { player_id, ready } => {
            player_mut(game, player_id)?.round1_ready = *ready;
        }
        FieldPatch::ResetAllProgress => {
            for player in game.players.values_mut() {
                player.score = 0;
                player.answers.clear();
                player.round1_ready = false;
            }
        }
        FieldPatch::ClearReadyFlags => {
            for player in game.players.values_mut() {
                player.round1_ready = false;
            }
        }
        FieldPatch::ScoreAll => {
            let scores: Vec<(PlayerId, u8)> = game
                .players
                .values()
                .map(|p| (p.id.clone(), scoring::score_player(game, p)))
                .collect();
            for (player_id, score) in scores {
                player_mut(game, &player_id)?.score = score;
            }
        }
    }
    Ok(())
}

/// Apply all patches or none of them
pub fn apply_patches(game: &Game, patches: &[FieldPatch]) -> GameResult<Game> {
    let mut next = game.clone();
    for patch in patches {
        apply_patch(&mut next, patch)?;
    }
    Ok(next)
}

pub fn remove_path(game: &mut Game, path: &FieldPath) {
    match path {
        FieldPath::CurrentRound => game.current_round = None,
        FieldPath::Round(n) => {
            game.rounds.remove(n);
        }
        FieldPath::Player(id) => {
            game.players.remove(id);
        }
    }
}

/// Live view of one PIN.
///
/// The first call to [`GameSubscription::next`] yields the current state
/// immediately, later calls wait for the next change. Dropping the
/// subscription unsubscribes.
pub struct GameSubscription {
    pin: String,
    rx: watch::Receiver<Option<Game>>,
    primed: bool,
}

impl GameSubscription {
    pub(crate) fn new(pin: String, rx: watch::Receiver<Option<Game>>) -> Self {
        Self {
            pin,
            rx,
            primed: false,
        }
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// `Some(None)` means the aggregate is gone; `None` means the store shut down
    pub async fn next(&mut self) -> Option<Option<Game>> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

/// Cancels a callback registration from [`on_change`] when dropped
pub struct SubscriptionHandle {
    task: tokio::task::JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Register `callback` for every state of `pin`, starting with the current one
pub async fn on_change<F>(
    store: &dyn GameStore,
    pin: &str,
    mut callback: F,
) -> GameResult<SubscriptionHandle>
where
    F: FnMut(Option<Game>) + Send + 'static,
{
    let mut subscription = store.subscribe(pin).await?;
    let task = tokio::spawn(async move {
        while let Some(game) = subscription.next().await {
            callback(game);
        }
    });
    Ok(SubscriptionHandle { task })
}

/// Persistence and fan-out for game aggregates, keyed by PIN
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Create or replace a whole aggregate
    async fn put(&self, pin: &str, game: Game) -> GameResult<()>;

    async fn get(&self, pin: &str) -> GameResult<Option<Game>>;

    async fn subscribe(&self, pin: &str) -> GameResult<GameSubscription>;

    /// Atomic, field-scoped merge. Fails with `GameNotFound` for unknown PINs.
    async fn merge_fields(&self, pin: &str, patches: Vec<FieldPatch>) -> GameResult<()>;

    /// Merge only if the aggregate still matches `precondition`
    async fn merge_fields_if(
        &self,
        pin: &str,
        precondition: Precondition,
        patches: Vec<FieldPatch>,
    ) -> GameResult<MergeOutcome>;

    async fn delete_field(&self, pin: &str, path: FieldPath) -> GameResult<()>;

    async fn delete(&self, pin: &str) -> GameResult<()>;

    /// Move an aggregate to a new key in one step, rewriting the PIN it and
    /// its players carry. `Ok(false)` if `to` is already taken.
    async fn rename(&self, from: &str, to: &str) -> GameResult<bool>;

    /// All live PINs
    async fn pins(&self) -> GameResult<Vec<String>>;

    /// Close every subscription; later calls fail with `StoreUnavailable`
    async fn shutdown(&self);
}
