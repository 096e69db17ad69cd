//! Random source abstraction for the training loop.
//!
//! The simulator only ever asks for two things: a uniform scalar in a closed
//! range and an index into a non-empty list. Any `rand::Rng` provides both;
//! tests script the values instead.

use rand::rngs::StdRng;
use rand::SeedableRng;

pub trait TrainingRng {
    /// Uniform draw from the closed range `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;
}

impl<T: ?Sized + rand::Rng> TrainingRng for T {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.random_range(low..=high)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// Seeded generator for a run: reproducible when a seed is given.
pub fn rng_for_run(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Replays fixed fractions in `[0, 1]`, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    outcomes: Vec<f64>,
    index: usize,
}

impl ScriptedRng {
    pub fn new(outcomes: Vec<f64>) -> Self {
        assert!(!outcomes.is_empty(), "ScriptedRng needs at least one outcome");
        Self { outcomes, index: 0 }
    }

    /// Every draw lands at the same relative position in its range.
    pub fn constant(fraction: f64) -> Self {
        Self::new(vec![fraction])
    }

    fn next_fraction(&mut self) -> f64 {
        let fraction = self.outcomes[self.index % self.outcomes.len()];
        self.index += 1;
        fraction.clamp(0.0, 1.0)
    }
}

impl TrainingRng for ScriptedRng {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        // Endpoints are returned exactly so tests can hit range bounds.
        match self.next_fraction() {
            f if f <= 0.0 => low,
            f if f >= 1.0 => high,
            f => low + (high - low) * f,
        }
    }

    fn pick(&mut self, len: usize) -> usize {
        let index = (self.next_fraction() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }
}
