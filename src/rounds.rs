//! Round generation
//!
//! Each round holds exactly [`ROUND_SIZE`] sentences. The composition is fixed,
//! the sampling and presentation order are random:
//!
//! - Round 1: 5 fake + 2 true, drawn from the curated round-1 shortlists.
//! - Round 2: 3 fake + 1 true repeated from round 1, 2 new fake + 1 new true.
//! - Round 3: 2 fake repeated from round 2, 2 other round-2 fakes labelled as
//!   rephrased, 1 new true, 1 new fake, 1 true repeated from round 2.
//!
//! "New" sentences never reuse an id from an earlier round.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::content::{self, ROUND1_FAKE_IDS, ROUND1_TRUE_IDS};
use crate::error::{GameError, GameResult};
use crate::types::{GameRound, RoundNumber, Sentence, SentenceId, ROUND_DURATION_SECS};

/// Shuffle `candidates` and keep the first `count`, failing when there are too few
fn pick<R: Rng + ?Sized>(
    rng: &mut R,
    mut candidates: Vec<Sentence>,
    count: usize,
    what: &'static str,
) -> GameResult<Vec<Sentence>> {
    if candidates.len() < count {
        return Err(GameError::PoolExhausted {
            what,
            wanted: count,
            found: candidates.len(),
        });
    }
    candidates.shuffle(rng);
    candidates.truncate(count);
    Ok(candidates)
}

fn unused(pool: &[Sentence], used: &HashSet<&str>) -> Vec<Sentence> {
    pool.iter()
        .filter(|s| !used.contains(s.id.as_str()))
        .cloned()
        .collect()
}

fn partition(sentences: &[Sentence]) -> (Vec<Sentence>, Vec<Sentence>) {
    sentences.iter().cloned().partition(|s| s.is_fake)
}

fn assemble<R: Rng + ?Sized>(rng: &mut R, parts: Vec<Vec<Sentence>>) -> Vec<Sentence> {
    let mut sentences: Vec<Sentence> = parts.into_iter().flatten().collect();
    sentences.shuffle(rng);
    sentences
}

/// 5 fake + 2 true from the round-1 shortlists
pub fn generate_round1<R: Rng + ?Sized>(rng: &mut R) -> GameResult<Vec<Sentence>> {
    let fake = pick(
        rng,
        content::shortlist(ROUND1_FAKE_IDS, true),
        5,
        "round 1 fake statements",
    )?;
    let true_ = pick(
        rng,
        content::shortlist(ROUND1_TRUE_IDS, false),
        2,
        "round 1 true statements",
    )?;
    Ok(assemble(rng, vec![fake, true_]))
}

/// 3 fake + 1 true repeated from round 1, plus 2 fake + 1 true never seen before
pub fn generate_round2<R: Rng + ?Sized>(
    rng: &mut R,
    round1: &[Sentence],
) -> GameResult<Vec<Sentence>> {
    let (round1_fake, round1_true) = partition(round1);
    let repeated_fake = pick(rng, round1_fake, 3, "round 1 fake statements to repeat")?;
    let repeated_true = pick(rng, round1_true, 1, "round 1 true statements to repeat")?;

    let used: HashSet<&str> = round1.iter().map(|s| s.id.as_str()).collect();
    let new_fake = pick(
        rng,
        unused(content::false_statements(), &used),
        2,
        "unused fake statements",
    )?;
    let new_true = pick(
        rng,
        unused(content::true_statements(), &used),
        1,
        "unused true statements",
    )?;

    Ok(assemble(
        rng,
        vec![repeated_fake, repeated_true, new_fake, new_true],
    ))
}

/// Sentences for round 3 plus the ids presented as rephrased
#[derive(Debug, Clone)]
pub struct Round3Draw {
    pub sentences: Vec<Sentence>,
    pub rephrased: Vec<SentenceId>,
}

/// Round 3 built from round 2. `earlier` holds every sentence shown before
/// round 2 so new picks can avoid them as well.
pub fn generate_round3<R: Rng + ?Sized>(
    rng: &mut R,
    round2: &[Sentence],
    earlier: &[Sentence],
) -> GameResult<Round3Draw> {
    let (round2_fake, round2_true) = partition(round2);

    let mut fakes = pick(rng, round2_fake, 4, "round 2 fake statements to repeat")?;
    // The content pool has no rephrased variants; the same statement stands in.
    let rephrased_fake = fakes.split_off(2);
    let repeated_fake = fakes;

    let used: HashSet<&str> = round2
        .iter()
        .chain(earlier)
        .map(|s| s.id.as_str())
        .collect();
    let new_true = pick(
        rng,
        unused(content::true_statements(), &used),
        1,
        "unused true statements",
    )?;
    let new_fake = pick(
        rng,
        unused(content::false_statements(), &used),
        1,
        "unused fake statements",
    )?;
    let previous_true = pick(rng, round2_true, 1, "round 2 true statements to repeat")?;

    let rephrased = rephrased_fake.iter().map(|s| s.id.clone()).collect();
    let sentences = assemble(
        rng,
        vec![repeated_fake, rephrased_fake, new_true, new_fake, previous_true],
    );

    Ok(Round3Draw {
        sentences,
        rephrased,
    })
}

/// Stamp a round envelope starting at `now_ms`.
///
/// `previous` is accepted for symmetry with the generators; it does not change
/// the envelope.
pub fn create_game_round(
    round_number: RoundNumber,
    sentences: Vec<Sentence>,
    _previous: Option<&GameRound>,
    now_ms: i64,
) -> GameRound {
    let duration = ROUND_DURATION_SECS;
    GameRound {
        round_number,
        sentences,
        start_time: now_ms,
        end_time: now_ms + i64::from(duration) * 1000,
        duration,
        rephrased: Vec::new(),
    }
}
