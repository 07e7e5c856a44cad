//! Dice for random gotos and `setrandom`.
//!
//! Stories draw through [`DeterministicRng`] so a playthrough can be replayed
//! from a seed, and tests can script which alternative a random link takes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the draws a story makes.
pub trait DeterministicRng: Send + Sync {
    /// Draws a whole number in `[min, max]`.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Chooses one of `len` alternatives, or `None` when there are none.
    fn pick(&mut self, len: usize) -> Option<usize> {
        let last = u32::try_from(len.checked_sub(1)?).unwrap_or(u32::MAX);
        let index = self.next_u32_range(0, last) as usize;
        Some(index.min(len - 1))
    }
}

/// Draws from `rand`'s standard generator.
#[derive(Debug)]
pub struct StdRandom(StdRng);

impl StdRandom {
    /// Seeds from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Seeds from a fixed value, for reproducible playthroughs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl DeterministicRng for StdRandom {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.0.random_range(min..=max)
    }
}
