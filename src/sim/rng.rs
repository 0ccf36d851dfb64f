//! Injectable randomness
//!
//! Everything that rolls dice goes through [`SimRng`] so tests can swap in a
//! scripted source and assert exact transition sequences.

use std::collections::VecDeque;
use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Source of uniform samples in [0, 1)
pub trait SimRng: Debug {
    fn next_f32(&mut self) -> f32;

    /// Uniform sample in [min, max)
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// True with the given probability
    fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// Uniform sample in [-extent, extent)
    fn symmetric(&mut self, extent: f32) -> f32 {
        self.range(-extent, extent)
    }
}

/// Seeded PCG source used by real sessions
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    rng: Pcg32,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SimRng for SeededRng {
    fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Replays a fixed list of samples, then repeats `fallback` forever
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    values: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRng {
    pub fn new(values: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            values: values.into_iter().collect(),
            fallback,
        }
    }

    /// Always returns the same sample
    pub fn constant(value: f32) -> Self {
        Self::new(std::iter::empty(), value)
    }

    pub fn push(&mut self, value: f32) {
        self.values.push_back(value);
    }
}

impl SimRng for ScriptedRng {
    fn next_f32(&mut self) -> f32 {
        self.values.pop_front().unwrap_or(self.fallback)
    }
}
