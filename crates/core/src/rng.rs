//! RNG module - piece randomizers
//!
//! Two policies are provided behind the [`Randomizer`] trait:
//!
//! - [`HistoryRandomizer`]: the arcade "history" randomizer. It remembers
//!   the last four pieces and rerolls up to a fixed number of times when the
//!   draw is in that history. The first piece of a game is never S, Z or O.
//! - [`BagRandomizer`]: the 7-bag, one of each piece per shuffled bag.
//!
//! Both are driven by [`SimpleRng`], so a seed always reproduces the same
//! sequence.

use serde::{Deserialize, Serialize};

use crate::types::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        // The high bits of an LCG are far better distributed than the low ones.
        ((self.next_u32() >> 16) % max.max(1)) as u32
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Source of upcoming piece identifiers.
pub trait Randomizer {
    /// Produce the next piece of the sequence.
    fn next_piece(&mut self) -> PieceKind;

    /// Rewind to the start of the sequence for `seed`.
    fn reset(&mut self, seed: u32);
}

/// Number of pieces remembered by the history randomizer.
pub const HISTORY_LEN: usize = 4;

/// Draw attempts before the history randomizer gives up rerolling.
pub const HISTORY_ROLLS: u32 = 6;

const INITIAL_HISTORY: [PieceKind; HISTORY_LEN] =
    [PieceKind::Z, PieceKind::Z, PieceKind::S, PieceKind::S];

const FIRST_PIECES: [PieceKind; 4] = [PieceKind::I, PieceKind::J, PieceKind::L, PieceKind::T];

#[derive(Debug, Clone)]
pub struct HistoryRandomizer {
    rng: SimpleRng,
    history: [PieceKind; HISTORY_LEN],
    first: bool,
}

impl HistoryRandomizer {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            history: INITIAL_HISTORY,
            first: true,
        }
    }

    fn remember(&mut self, kind: PieceKind) {
        self.history.rotate_left(1);
        self.history[HISTORY_LEN - 1] = kind;
    }

    #[cfg(test)]
    fn history(&self) -> &[PieceKind; HISTORY_LEN] {
        &self.history
    }
}

impl Randomizer for HistoryRandomizer {
    fn next_piece(&mut self) -> PieceKind {
        let kind = if self.first {
            self.first = false;
            FIRST_PIECES[self.rng.next_range(FIRST_PIECES.len() as u32) as usize]
        } else {
            let mut kind = PieceKind::ALL[self.rng.next_range(7) as usize];
            for _ in 1..HISTORY_ROLLS {
                if !self.history.contains(&kind) {
                    break;
                }
                kind = PieceKind::ALL[self.rng.next_range(7) as usize];
            }
            kind
        };
        self.remember(kind);
        kind
    }

    fn reset(&mut self, seed: u32) {
        *self = Self::new(seed);
    }
}

/// 7-bag piece generator
#[derive(Debug, Clone)]
pub struct BagRandomizer {
    bag: [PieceKind; 7],
    bag_index: usize,
    rng: SimpleRng,
}

impl BagRandomizer {
    pub fn new(seed: u32) -> Self {
        let mut bag = Self {
            bag: PieceKind::ALL,
            bag_index: 0,
            rng: SimpleRng::new(seed),
        };
        bag.refill_bag();
        bag
    }

    fn refill_bag(&mut self) {
        self.bag = PieceKind::ALL;
        self.rng.shuffle(&mut self.bag);
        self.bag_index = 0;
    }
}

impl Randomizer for BagRandomizer {
    fn next_piece(&mut self) -> PieceKind {
        if self.bag_index >= self.bag.len() {
            self.refill_bag();
        }
        let piece = self.bag[self.bag_index];
        self.bag_index += 1;
        piece
    }

    fn reset(&mut self, seed: u32) {
        *self = Self::new(seed);
    }
}

/// Randomizer policy selected by a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomizerKind {
    #[default]
    History,
    Bag,
}

impl RandomizerKind {
    pub fn build(self, seed: u32) -> PieceRandomizer {
        match self {
            RandomizerKind::History => PieceRandomizer::History(HistoryRandomizer::new(seed)),
            RandomizerKind::Bag => PieceRandomizer::Bag(BagRandomizer::new(seed)),
        }
    }
}

/// A concrete randomizer owned by a player.
#[derive(Debug, Clone)]
pub enum PieceRandomizer {
    History(HistoryRandomizer),
    Bag(BagRandomizer),
}

impl Randomizer for PieceRandomizer {
    fn next_piece(&mut self) -> PieceKind {
        match self {
            PieceRandomizer::History(r) => r.next_piece(),
            PieceRandomizer::Bag(r) => r.next_piece(),
        }
    }

    fn reset(&mut self, seed: u32) {
        match self {
            PieceRandomizer::History(r) => r.reset(seed),
            PieceRandomizer::Bag(r) => r.reset(seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(r: &mut impl Randomizer, n: usize) -> Vec<PieceKind> {
        (0..n).map(|_| r.next_piece()).collect()
    }

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);
        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_range_bounds() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            assert!(rng.next_range(7) < 7);
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn history_first_piece_is_never_s_z_or_o() {
        for seed in 0..200 {
            let first = HistoryRandomizer::new(seed).next_piece();
            assert!(
                !matches!(first, PieceKind::S | PieceKind::Z | PieceKind::O),
                "seed {seed} produced {first:?}"
            );
        }
    }

    #[test]
    fn history_remembers_last_four() {
        let mut r = HistoryRandomizer::new(99);
        let drawn = draw(&mut r, 6);
        assert_eq!(r.history(), &drawn[2..6]);
    }

    #[test]
    fn history_rarely_repeats_immediately() {
        let mut r = HistoryRandomizer::new(4242);
        let drawn = draw(&mut r, 700);
        let repeats = drawn.windows(2).filter(|w| w[0] == w[1]).count();
        // Pure uniform draws would repeat about 100 times in 700.
        assert!(repeats < 30, "too many immediate repeats: {repeats}");
    }

    #[test]
    fn bag_draws_all_seven_per_bag() {
        let mut r = BagRandomizer::new(1);
        for _ in 0..3 {
            let mut bag = draw(&mut r, 7);
            bag.sort_by_key(|k| k.id());
            assert_eq!(bag, PieceKind::ALL.to_vec());
        }
    }

    #[test]
    fn reset_replays_the_same_sequence() {
        for kind in [RandomizerKind::History, RandomizerKind::Bag] {
            let mut r = kind.build(31337);
            let first = draw(&mut r, 50);
            r.reset(31337);
            assert_eq!(draw(&mut r, 50), first);
        }
    }
}
