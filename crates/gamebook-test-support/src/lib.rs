//! Shared test mocks and utilities for the gamebook engine.

mod rng;
mod stage;
mod store;

pub use rng::{MockRng, SequenceRng};
pub use stage::ScriptedStage;
pub use store::{FailingSaveStore, MemorySaveStore};
