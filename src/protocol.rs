use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GameError;
use crate::i18n;
use crate::machine::{AdvanceOutcome, AdvanceTriggers};
use crate::scoring::{self, PlayerScore, ScoreCategory};
use crate::types::*;

pub const PROTOCOL_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Follow a game without joining it (admin dashboard, projector)
    Watch {
        pin: Pin,
    },
    JoinGame {
        pin: Pin,
        name: String,
    },
    /// Reattach to an existing player after a reconnect
    Rejoin {
        pin: Pin,
        player_id: PlayerId,
        token: String,
    },
    SubmitAnswer {
        round: RoundNumber,
        sentence_id: SentenceId,
        is_fake: bool,
    },
    SetReady {
        ready: bool,
    },
    SetLanguage {
        lang: Language,
    },
    RequestLeaderboard,
    // Admin-only messages
    AdminCreateGame,
    AdminStartGame,
    AdminAdvance {
        /// Status the admin saw when asking; stale requests become no-ops
        #[serde(default)]
        from: Option<GameStatus>,
    },
    AdminStopGame,
    AdminRestartGame,
    AdminRegeneratePin,
    AdminKickPlayer {
        player_id: PlayerId,
    },
    AdminRecalculateScores,
}

impl ClientMessage {
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            ClientMessage::AdminCreateGame
                | ClientMessage::AdminStartGame
                | ClientMessage::AdminAdvance { .. }
                | ClientMessage::AdminStopGame
                | ClientMessage::AdminRestartGame
                | ClientMessage::AdminRegeneratePin
                | ClientMessage::AdminKickPlayer { .. }
                | ClientMessage::AdminRecalculateScores
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        lang: Language,
        rtl: bool,
        /// Epoch milliseconds, for client clock offset
        server_now: i64,
    },
    /// Player-facing view of the watched game
    GameUpdate {
        game: GameView,
    },
    /// Full view for the admin, plus whether an advance is due
    AdminGameUpdate {
        game: GameView,
        triggers: AdvanceTriggers,
    },
    GameCreated {
        pin: Pin,
    },
    Joined {
        pin: Pin,
        player_id: PlayerId,
        name: String,
        /// Keep this to rejoin after a reload
        token: String,
    },
    AnswerAck {
        round: RoundNumber,
        sentence_id: SentenceId,
        is_fake: bool,
    },
    ReadyAck {
        ready: bool,
    },
    Advanced {
        from: GameStatus,
        to: GameStatus,
        outcome: AdvanceOutcome,
    },
    Leaderboard {
        entries: Vec<PlayerScore>,
        categories: Vec<CategoryCount>,
    },
    PinChanged {
        old_pin: Pin,
        new_pin: Pin,
    },
    /// The watched game no longer exists under this PIN
    GameClosed {
        pin: Pin,
    },
    /// Sent to a player removed by the admin
    Kicked,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    /// Localized error for a client
    pub fn error(err: &GameError, lang: Language) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: i18n::translate(err.message_key(), lang).to_string(),
        }
    }

    pub fn leaderboard(game: &Game, lang: Language) -> Self {
        let entries = scoring::leaderboard(game, lang);
        let categories = scoring::category_counts(&entries)
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category,
                label: category.label(lang).to_string(),
                count,
            })
            .collect();
        ServerMessage::Leaderboard {
            entries,
            categories,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryCount {
    pub category: ScoreCategory,
    pub label: String,
    pub count: usize,
}

/// A sentence as a client sees it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentenceView {
    pub id: SentenceId,
    pub text: LocalizedText,
    /// Ground truth; withheld from players until results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_fake: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rephrased: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundView {
    pub round_number: RoundNumber,
    pub sentences: Vec<SentenceView>,
    pub start_time: i64,
    pub end_time: i64,
    pub duration: u32,
}

impl RoundView {
    fn new(round: &GameRound, reveal: bool) -> Self {
        Self {
            round_number: round.round_number,
            sentences: round
                .sentences
                .iter()
                .map(|s| SentenceView {
                    id: s.id.clone(),
                    text: s.text.clone(),
                    is_fake: reveal.then_some(s.is_fake),
                    // Rephrased repeats are always fakes, so the label is part of the truth
                    rephrased: reveal && round.rephrased.contains(&s.id),
                })
                .collect(),
            start_time: round.start_time,
            end_time: round.end_time,
            duration: round.duration,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: u8,
    pub joined_at: i64,
    pub round1_ready: bool,
    /// Answers given in the current round
    pub answered: usize,
    /// Full answer map; only for the admin and the player itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<AnswerMap>,
}

impl PlayerView {
    fn new(player: &Player, current_round: Option<RoundNumber>, with_answers: bool) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            score: player.score,
            joined_at: player.joined_at,
            round1_ready: player.round1_ready,
            answered: current_round
                .and_then(|n| player.answers.get(&n))
                .map_or(0, |answers| answers.len()),
            answers: with_answers.then(|| player.answers.clone()),
        }
    }
}

/// Role-specific projection of a game. Never carries player tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameView {
    pub pin: Pin,
    pub status: GameStatus,
    pub status_label: String,
    pub created_at: i64,
    pub current_round: Option<RoundNumber>,
    pub rounds: BTreeMap<RoundNumber, RoundView>,
    /// Ordered by join time
    pub players: Vec<PlayerView>,
}

impl GameView {
    fn build(game: &Game, lang: Language, reveal: bool, sees_answers: impl Fn(&Player) -> bool) -> Self {
        let mut players: Vec<&Player> = game.active_players().collect();
        players.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));

        Self {
            pin: game.pin.clone(),
            status: game.status,
            status_label: i18n::status_label(game.status, lang).to_string(),
            created_at: game.created_at,
            current_round: game.current_round,
            rounds: game
                .rounds
                .iter()
                .map(|(n, r)| (*n, RoundView::new(r, reveal)))
                .collect(),
            players: players
                .into_iter()
                .map(|p| PlayerView::new(p, game.current_round, sees_answers(p)))
                .collect(),
        }
    }

    /// What a player (or spectator, when `viewer` is None) may see
    pub fn for_player(game: &Game, viewer: Option<&str>, lang: Language) -> Self {
        let reveal = game.status == GameStatus::Results;
        Self::build(game, lang, reveal, |p| Some(p.id.as_str()) == viewer)
    }

    pub fn for_admin(game: &Game, lang: Language) -> Self {
        Self::build(game, lang, true, |_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounds::create_game_round;

    fn game() -> Game {
        let mut game = Game::new("123456".to_string(), "admin".to_string(), 0);
        for (id, joined) in [("bob", 2), ("alice", 1)] {
            let mut answers = AnswerMap::new();
            answers.entry(2).or_default().insert("s1".to_string(), true);
            game.players.insert(
                id.to_string(),
                Player {
                    id: id.to_string(),
                    name: id.to_string(),
                    game_pin: "123456".to_string(),
                    score: 0,
                    answers,
                    joined_at: joined,
                    round1_ready: false,
                    kicked: false,
                    token: format!("{}-secret", id),
                },
            );
        }
        let sentence = Sentence {
            id: "s1".to_string(),
            text: LocalizedText {
                en: "x".to_string(),
                he: "x".to_string(),
                ar: "x".to_string(),
            },
            is_fake: true,
        };
        let mut round = create_game_round(2, vec![sentence], None, 0);
        round.rephrased = vec!["s1".to_string()];
        game.rounds.insert(2, round);
        game.status = GameStatus::Round2;
        game.current_round = Some(2);
        game
    }

    #[test]
    fn test_client_message_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"submit_answer","round":2,"sentence_id":"s-30","is_fake":true}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SubmitAnswer {
                round: 2,
                sentence_id: "s-30".to_string(),
                is_fake: true
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"admin_advance"}"#).unwrap();
        assert_eq!(msg, ClientMessage::AdminAdvance { from: None });
        assert!(msg.is_admin_only());

        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"admin_advance","from":"round2"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::AdminAdvance {
                from: Some(GameStatus::Round2)
            }
        );
    }

    #[test]
    fn test_error_message_is_localized() {
        let msg = ServerMessage::error(&GameError::JoinClosed, Language::He);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "JOIN_CLOSED");
        assert_eq!(json["msg"], "המשחק כבר התחיל");
    }

    #[test]
    fn test_player_view_hides_secrets() {
        let game = game();
        let view = GameView::for_player(&game, Some("alice"), Language::En);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("secret"));

        let round = &view.rounds[&2];
        assert_eq!(round.sentences[0].is_fake, None);
        assert!(!round.sentences[0].rephrased);

        assert_eq!(view.players[0].id, "alice");
        assert!(view.players[0].answers.is_some());
        assert_eq!(view.players[1].id, "bob");
        assert!(view.players[1].answers.is_none());
        assert_eq!(view.players[1].answered, 1);
    }

    #[test]
    fn test_player_view_gives_no_hint_of_truth_before_results() {
        use crate::machine::{plan_advance, plan_start};
        use crate::store::apply_patches;
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut alice = game().players["alice"].clone();
            alice.answers.clear();
            let mut game = Game::new("123456".to_string(), "admin".to_string(), 0);
            game.players.insert(alice.id.clone(), alice);

            let patches = plan_start(&game, &mut rng, 0).unwrap();
            game = apply_patches(&game, &patches).unwrap();
            loop {
                let view = GameView::for_player(&game, Some("alice"), Language::En);
                let json = serde_json::to_string(&view).unwrap();
                assert!(!json.contains("is_fake"), "{}", json);
                assert!(!json.contains("rephrased"), "{}", json);
                for round in view.rounds.values() {
                    for sentence in &round.sentences {
                        // Same id shape for both partitions
                        assert!(sentence.id.starts_with("s-"), "{}", sentence.id);
                        assert_eq!(sentence.id.len(), 4, "{}", sentence.id);
                    }
                }

                if game.status == GameStatus::Round3 {
                    break;
                }
                let patches = plan_advance(&game, &mut rng, 0).unwrap();
                game = apply_patches(&game, &patches).unwrap();
            }
        }
    }

    #[test]
    fn test_results_reveal_truth() {
        let mut game = game();
        game.status = GameStatus::Results;
        let view = GameView::for_player(&game, None, Language::En);
        assert_eq!(view.rounds[&2].sentences[0].is_fake, Some(true));
        assert!(view.rounds[&2].sentences[0].rephrased);
        assert_eq!(view.status_label, "Final Results");
    }

    #[test]
    fn test_admin_view() {
        let game = game();
        let view = GameView::for_admin(&game, Language::Ar);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("secret"));
        assert_eq!(view.rounds[&2].sentences[0].is_fake, Some(true));
        assert!(view.players.iter().all(|p| p.answers.is_some()));
        assert_eq!(view.status_label, "الجولة 2");
    }

    #[test]
    fn test_leaderboard_message() {
        let mut game = game();
        game.players.get_mut("alice").unwrap().score = 95;
        let ServerMessage::Leaderboard {
            entries,
            categories,
        } = ServerMessage::leaderboard(&game, Language::En)
        else {
            panic!("expected leaderboard");
        };
        assert_eq!(entries[0].player_name, "alice");
        assert_eq!(categories[0].label, "Lie Hunter");
        assert_eq!(categories[0].count, 1);
        assert_eq!(categories[3].count, 1);
    }
}
