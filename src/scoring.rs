//! Score computation and category tiers.
//!
//! A player's answer is "I believe this statement is fake"; it is correct when
//! it equals the sentence's `is_fake`. Round 1 is read-only and never scored.
//! Every sentence of a scored round counts towards the total, so unanswered
//! sentences count against the player.

use serde::{Deserialize, Serialize};

use crate::i18n;
use crate::types::{Game, Language, Player, PlayerId};

/// Rounds before this one are not scored
const FIRST_SCORED_ROUND: u8 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreCategory {
    Victim,
    #[serde(rename = "Truth Explorer")]
    TruthExplorer,
    #[serde(rename = "Lie Investigator")]
    LieInvestigator,
    #[serde(rename = "Lie Hunter")]
    LieHunter,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 4] = [
        ScoreCategory::LieHunter,
        ScoreCategory::LieInvestigator,
        ScoreCategory::TruthExplorer,
        ScoreCategory::Victim,
    ];

    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ScoreCategory::LieHunter,
            80..=89 => ScoreCategory::LieInvestigator,
            60..=79 => ScoreCategory::TruthExplorer,
            _ => ScoreCategory::Victim,
        }
    }

    pub fn translation_key(&self) -> &'static str {
        match self {
            ScoreCategory::Victim => "category.victim",
            ScoreCategory::TruthExplorer => "category.truthExplorer",
            ScoreCategory::LieInvestigator => "category.lieInvestigator",
            ScoreCategory::LieHunter => "category.lieHunter",
        }
    }

    pub fn label(&self, lang: Language) -> &'static str {
        i18n::translate(self.translation_key(), lang)
    }
}

/// Tally of one player's answers over the scored rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreTally {
    pub correct: u32,
    pub total: u32,
}

impl ScoreTally {
    /// Percentage rounded half-up; 0 when nothing was playable
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (200 * self.correct + self.total) / (2 * self.total);
        pct.min(100) as u8
    }
}

pub fn tally_player(game: &Game, player: &Player) -> ScoreTally {
    let mut tally = ScoreTally::default();
    for round in game
        .rounds
        .values()
        .filter(|r| r.round_number >= FIRST_SCORED_ROUND)
    {
        for sentence in &round.sentences {
            tally.total += 1;
            if player.answer(round.round_number, &sentence.id) == Some(sentence.is_fake) {
                tally.correct += 1;
            }
        }
    }
    tally
}

/// Percentage score of `player` over every scored round present in `game`
pub fn score_player(game: &Game, player: &Player) -> u8 {
    tally_player(game, player).percentage()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub player_name: String,
    pub score: u8,
    pub category: ScoreCategory,
    pub category_label: String,
}

/// Ranked view of persisted scores: highest score first, earlier joiners win ties
pub fn leaderboard(game: &Game, lang: Language) -> Vec<PlayerScore> {
    let mut players: Vec<&Player> = game.active_players().collect();
    players.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.joined_at.cmp(&b.joined_at))
            .then_with(|| a.name.cmp(&b.name))
    });

    players
        .into_iter()
        .map(|p| {
            let category = ScoreCategory::from_score(p.score);
            PlayerScore {
                player_id: p.id.clone(),
                player_name: p.name.clone(),
                score: p.score,
                category,
                category_label: category.label(lang).to_string(),
            }
        })
        .collect()
}

/// Number of players per category, in display order
pub fn category_counts(entries: &[PlayerScore]) -> Vec<(ScoreCategory, usize)> {
    ScoreCategory::ALL
        .iter()
        .map(|c| (*c, entries.iter().filter(|e| e.category == *c).count()))
        .collect()
}
