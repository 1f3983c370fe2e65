//! Randomness sources for the game engines.
//!
//! Every draw a game makes goes through [`RandomSource`], so a table can be
//! driven by a seeded ChaCha stream in production and by a scripted source
//! when a particular wheel result or card order has to be reproduced.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;

use crate::cards::Card;

pub trait RandomSource: Send {
    /// Uniform integer in `0..upper`. Returns 0 when `upper` is 0.
    fn draw(&mut self, upper: u32) -> u32;

    /// Uniform permutation of `cards` in place.
    fn shuffle(&mut self, cards: &mut [Card]);
}

/// ChaCha20-backed source; identical seeds yield identical games.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: ChaCha20Rng,
}

impl SeededSource {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Seeded from the thread-local generator.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_rng(&mut rand::rng()),
        }
    }
}

impl RandomSource for SeededSource {
    fn draw(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.rng.random_range(0..upper)
    }

    fn shuffle(&mut self, cards: &mut [Card]) {
        cards.shuffle(&mut self.rng);
    }
}

/// Replays queued results instead of drawing.
///
/// Draws are popped in order and reduced modulo the requested bound; an empty
/// queue yields 0. Each shuffle consumes one queued deck top: those cards are
/// moved to the front in the given order and the rest keep their relative
/// order. Without a queued top the cards are left as they are.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    draws: VecDeque<u32>,
    deck_tops: VecDeque<Vec<Card>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draws(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            deck_tops: VecDeque::new(),
        }
    }

    pub fn push_draw(&mut self, value: u32) {
        self.draws.push_back(value);
    }

    pub fn push_deck_top(&mut self, top: Vec<Card>) {
        self.deck_tops.push_back(top);
    }
}

impl RandomSource for ScriptedSource {
    fn draw(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.draws.pop_front().map(|v| v % upper).unwrap_or(0)
    }

    fn shuffle(&mut self, cards: &mut [Card]) {
        let Some(top) = self.deck_tops.pop_front() else {
            return;
        };
        let mut ordered: Vec<Card> = Vec::with_capacity(cards.len());
        for c in top {
            if cards.contains(&c) && !ordered.contains(&c) {
                ordered.push(c);
            }
        }
        let rest: Vec<Card> = cards
            .iter()
            .copied()
            .filter(|c| !ordered.contains(c))
            .collect();
        ordered.extend(rest);
        cards.copy_from_slice(&ordered[..cards.len()]);
    }
}
