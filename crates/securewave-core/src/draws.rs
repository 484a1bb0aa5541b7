//! Random draw sources for the threat simulation
//!
//! The simulator never touches a random number generator directly. It asks a
//! [`DrawSource`] for uniform draws, so tests and demos can replace the
//! entropy-backed source with a scripted sequence and force specific outcomes
//! (spawn / no spawn, remove / keep, a given severity).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniform draws for the simulation
pub trait DrawSource: Send + Sync {
    /// Uniform draw in [0.0, 1.0)
    fn unit(&mut self) -> f64;

    /// Random suffix used to make marker ids unique
    fn suffix(&mut self) -> u64;

    /// True with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform draw in [lo, hi)
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (self.unit() as f32) * (hi - lo)
    }
}

/// Draws backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngDraws<R: Rng> {
    rng: R,
}

impl<R: Rng> RngDraws<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDraws<StdRng> {
    /// Non-deterministic draws seeded from the platform entropy source
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible draws for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send + Sync> DrawSource for RngDraws<R> {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn suffix(&mut self) -> u64 {
        self.rng.gen::<u64>()
    }
}

/// Pre-recorded draws, consumed in order
///
/// Once the script runs out every further draw returns `fallback`. Suffixes
/// are a simple counter so scripted ids never collide.
#[derive(Debug, Clone)]
pub struct ScriptedDraws {
    script: VecDeque<f64>,
    fallback: f64,
    next_suffix: u64,
}

impl ScriptedDraws {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            script: draws.into_iter().collect(),
            fallback,
            next_suffix: 0,
        }
    }

    /// Append draws to the end of the script
    pub fn push(&mut self, draws: impl IntoIterator<Item = f64>) {
        self.script.extend(draws);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DrawSource for ScriptedDraws {
    fn unit(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }

    fn suffix(&mut self) -> u64 {
        self.next_suffix += 1;
        self.next_suffix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_draws_in_order() {
        let mut draws = ScriptedDraws::new([0.1, 0.9], 0.5);
        assert_eq!(draws.unit(), 0.1);
        assert_eq!(draws.unit(), 0.9);
        assert_eq!(draws.unit(), 0.5);
        assert_eq!(draws.remaining(), 0);
    }

    #[test]
    fn test_scripted_suffixes_unique() {
        let mut draws = ScriptedDraws::new([], 0.0);
        let a = draws.suffix();
        let b = draws.suffix();
        assert_ne!(a, b);
    }

    #[test]
    fn test_chance_and_range() {
        let mut draws = ScriptedDraws::new([0.69, 0.7, 0.5], 0.0);
        assert!(draws.chance(0.7));
        assert!(!draws.chance(0.7));
        assert_eq!(draws.range(-4.0, 4.0), 0.0);
    }

    #[test]
    fn test_seeded_draws_reproducible() {
        let mut a = RngDraws::seeded(7);
        let mut b = RngDraws::seeded(7);
        for _ in 0..16 {
            let x = a.unit();
            assert_eq!(x, b.unit());
            assert!((0.0..1.0).contains(&x));
        }
    }
}
