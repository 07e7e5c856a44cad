//! Gamebook Core — shared story abstractions.
//!
//! Values, the variable store, settings, errors, and the ports the engine
//! talks through: `Evaluator`, `Stage`, `SaveStore` and `DeterministicRng`.
//! It contains no infrastructure code.

pub mod error;
pub mod evaluator;
pub mod rng;
pub mod settings;
pub mod stage;
pub mod store;
pub mod value;
pub mod variables;

pub use error::{EvalError, StoryError};
pub use value::Value;
pub use variables::Variables;
