//! Randomness port: rolling six-sided dice
//!
//! Battles draw every die through a `DiceRoller`, so a seeded or scripted
//! roller reproduces a battle exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

use crate::battle::constants::DIE_SIDES;

/// Source of die results in 1..=6
pub trait DiceRoller {
    fn roll(&mut self, count: u32) -> Vec<u8>;
}

/// Seeded pseudo-random dice
#[derive(Debug, Clone)]
pub struct ChaChaDice {
    rng: ChaCha8Rng,
}

impl ChaChaDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DiceRoller for ChaChaDice {
    fn roll(&mut self, count: u32) -> Vec<u8> {
        (0..count).map(|_| self.rng.gen_range(1..=DIE_SIDES)).collect()
    }
}

/// Replays a fixed list of rolls, then repeats `fallback`
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<u8>,
    fallback: u8,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 1,
        }
    }

    /// Every die shows the same face
    pub fn constant(face: u8) -> Self {
        Self {
            rolls: VecDeque::new(),
            fallback: face,
        }
    }

    pub fn with_fallback(mut self, face: u8) -> Self {
        self.fallback = face;
        self
    }

    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, count: u32) -> Vec<u8> {
        (0..count)
            .map(|_| self.rolls.pop_front().unwrap_or(self.fallback))
            .collect()
    }
}
