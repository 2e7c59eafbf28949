use axum::http::StatusCode;

use crate::types::{GameStatus, Pin, PlayerId};

pub type GameResult<T> = Result<T, GameError>;

/// Everything the game core can fail with.
///
/// Advancing a game that another observer already advanced is not an error,
/// see [`crate::state::AdvanceOutcome`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("Game store is unavailable")]
    StoreUnavailable,

    #[error("Game {0} not found")]
    GameNotFound(Pin),

    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("Not enough {what} left in the content pool (wanted {wanted}, found {found})")]
    PoolExhausted {
        what: &'static str,
        wanted: usize,
        found: usize,
    },

    #[error("Admin privileges required")]
    Unauthorized,

    #[error("Cannot {action} while game is in {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: GameStatus,
    },

    #[error("Cannot start a game without players")]
    NoPlayers,

    #[error("Game has already started, joining is closed")]
    JoinClosed,

    #[error("Round {0} has no data")]
    RoundDataMissing(u8),

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Ready flag can only be set during round 1")]
    NotInRound1,

    #[error("Invalid PIN '{0}' (expected 6 digits)")]
    InvalidPin(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Snapshot file error: {0}")]
    SnapshotIo(String),
}

impl GameError {
    /// Stable protocol error code
    pub fn code(&self) -> &'static str {
        match self {
            GameError::StoreUnavailable => "STORE_UNAVAILABLE",
            GameError::GameNotFound(_) => "GAME_NOT_FOUND",
            GameError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            GameError::PoolExhausted { .. } => "POOL_EXHAUSTED",
            GameError::Unauthorized => "UNAUTHORIZED",
            GameError::InvalidTransition { .. } => "INVALID_TRANSITION",
            GameError::NoPlayers => "NO_PLAYERS",
            GameError::JoinClosed => "JOIN_CLOSED",
            GameError::RoundDataMissing(_) => "ROUND_DATA_MISSING",
            GameError::InvalidAnswer(_) => "INVALID_ANSWER",
            GameError::NotInRound1 => "NOT_IN_ROUND1",
            GameError::InvalidPin(_) => "INVALID_PIN",
            GameError::InvalidSnapshot(_) => "INVALID_SNAPSHOT",
            GameError::SnapshotIo(_) => "SNAPSHOT_IO",
        }
    }

    /// Translation key for the user-facing message
    pub fn message_key(&self) -> &'static str {
        match self {
            GameError::GameNotFound(_) | GameError::InvalidPin(_) => "error.gameNotFound",
            GameError::JoinClosed => "error.joinClosed",
            GameError::Unauthorized => "error.unauthorized",
            GameError::NoPlayers => "error.noPlayers",
            GameError::PlayerNotFound(_) => "error.playerNotFound",
            _ => "error.generic",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::StoreUnavailable | GameError::PoolExhausted { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GameError::GameNotFound(_) | GameError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            GameError::Unauthorized => StatusCode::UNAUTHORIZED,
            GameError::InvalidTransition { .. }
            | GameError::NoPlayers
            | GameError::JoinClosed
            | GameError::RoundDataMissing(_)
            | GameError::NotInRound1 => StatusCode::CONFLICT,
            GameError::InvalidAnswer(_)
            | GameError::InvalidPin(_)
            | GameError::InvalidSnapshot(_) => StatusCode::BAD_REQUEST,
            GameError::SnapshotIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
