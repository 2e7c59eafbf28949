use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Opaque ID types for type safety
pub type Pin = String;
pub type PlayerId = String;
pub type SentenceId = String;
pub type AdminId = String;
pub type RoundNumber = u8;

/// Answers of one player: round number -> sentence id -> "player thinks it's fake"
pub type AnswerMap = BTreeMap<RoundNumber, BTreeMap<SentenceId, bool>>;

pub const ROUND_COUNT: RoundNumber = 3;
pub const ROUND_SIZE: usize = 7;
pub const ROUND_DURATION_SECS: u32 = 120;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    He,
    Ar,
}

impl Language {
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "he" => Some(Language::He),
            "ar" => Some(Language::Ar),
            _ => None,
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::He | Language::Ar)
    }
}

/// Parallel translations of one piece of text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalizedText {
    pub en: String,
    pub he: String,
    pub ar: String,
}

impl LocalizedText {
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::He => &self.he,
            Language::Ar => &self.ar,
        }
    }
}

/// A statement from the content pool; `is_fake` is the ground truth
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub id: SentenceId,
    pub text: LocalizedText,
    pub is_fake: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Lobby,
    Round1,
    Round2,
    Round3,
    Results,
}

impl GameStatus {
    /// Round number encoded in the status, if any
    pub fn round_number(&self) -> Option<RoundNumber> {
        match self {
            GameStatus::Round1 => Some(1),
            GameStatus::Round2 => Some(2),
            GameStatus::Round3 => Some(3),
            GameStatus::Lobby | GameStatus::Results => None,
        }
    }

    pub fn for_round(round: RoundNumber) -> Option<Self> {
        match round {
            1 => Some(GameStatus::Round1),
            2 => Some(GameStatus::Round2),
            3 => Some(GameStatus::Round3),
            _ => None,
        }
    }

    pub fn is_round(&self) -> bool {
        self.round_number().is_some()
    }
}

/// One timed phase of the game. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameRound {
    pub round_number: RoundNumber,
    pub sentences: Vec<Sentence>,
    /// Epoch milliseconds
    pub start_time: i64,
    /// Epoch milliseconds, `start_time + duration * 1000`
    pub end_time: i64,
    /// Seconds
    pub duration: u32,
    /// Ids of sentences presented as rephrased repeats (round 3 only).
    /// The text is identical to the earlier round.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rephrased: Vec<SentenceId>,
}

impl GameRound {
    pub fn sentence(&self, id: &str) -> Option<&Sentence> {
        self.sentences.iter().find(|s| s.id == id)
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.end_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub game_pin: Pin,
    pub score: u8,
    #[serde(default)]
    pub answers: AnswerMap,
    pub joined_at: i64,
    #[serde(default)]
    pub round1_ready: bool,
    /// Never set by this server: kicking removes the player record. Read so
    /// that imported snapshots carrying flagged players keep them out of play.
    #[serde(default)]
    pub kicked: bool,
    /// Secret handed to the joining client; required to act as this player
    #[serde(default)]
    pub token: String,
}

impl Player {
    pub fn answer(&self, round: RoundNumber, sentence_id: &str) -> Option<bool> {
        self.answers
            .get(&round)
            .and_then(|answers| answers.get(sentence_id))
            .copied()
    }

    /// True when every sentence of `round` has an answer
    pub fn has_answered_all(&self, round: &GameRound) -> bool {
        round
            .sentences
            .iter()
            .all(|s| self.answer(round.round_number, &s.id).is_some())
    }
}

/// The aggregate root: all state of one game session, keyed by PIN
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub pin: Pin,
    pub status: GameStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_round: Option<RoundNumber>,
    #[serde(default)]
    pub rounds: BTreeMap<RoundNumber, GameRound>,
    #[serde(default)]
    pub players: HashMap<PlayerId, Player>,
    pub admin_id: AdminId,
}

impl Game {
    pub fn new(pin: Pin, admin_id: AdminId, created_at: i64) -> Self {
        Self {
            id: pin.clone(),
            pin,
            status: GameStatus::Lobby,
            created_at,
            current_round: None,
            rounds: BTreeMap::new(),
            players: HashMap::new(),
            admin_id,
        }
    }

    pub fn current_round_data(&self) -> Option<&GameRound> {
        self.current_round.and_then(|n| self.rounds.get(&n))
    }

    /// Players without the `kicked` flag
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| !p.kicked)
    }

    pub fn player_by_token(&self, player_id: &str, token: &str) -> Option<&Player> {
        self.players
            .get(player_id)
            .filter(|p| !p.token.is_empty() && p.token == token)
    }
}

/// 6 ASCII digits
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Player,
}
