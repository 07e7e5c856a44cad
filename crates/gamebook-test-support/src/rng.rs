//! Scripted dice for random gotos and `setrandom` in tests.

use gamebook_core::rng::DeterministicRng;

/// Always draws the lowest value, so every random choice lands on the first
/// alternative and `setrandom` stores its lower bound.
#[derive(Debug, Default)]
pub struct MockRng;

impl DeterministicRng for MockRng {
    fn next_u32_range(&mut self, min: u32, _max: u32) -> u32 {
        min
    }
}

/// Replays scripted draws in order, clamping each into the requested range.
///
/// Once the script runs out the draws start again from the beginning, so a
/// single value fixes every choice a story makes.
#[derive(Debug)]
pub struct SequenceRng {
    draws: Vec<u32>,
    cursor: usize,
}

impl SequenceRng {
    /// Scripts the given draws. An empty script behaves like [`MockRng`].
    #[must_use]
    pub fn new(draws: Vec<u32>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// How many draws the story has taken so far.
    #[must_use]
    pub fn taken(&self) -> usize {
        self.cursor
    }
}

impl DeterministicRng for SequenceRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        let Some(draw) = self.draws.get(self.cursor % self.draws.len().max(1)).copied() else {
            return min;
        };
        self.cursor += 1;
        draw.clamp(min, max.max(min))
    }
}
