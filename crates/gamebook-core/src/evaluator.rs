//! Expression evaluation port.

use crate::error::EvalError;
use crate::value::Value;
use crate::variables::Variables;

/// Evaluates author-written expressions against the story variables.
///
/// Implementations may read and write variables but must not reach outside
/// the store.
pub trait Evaluator: Send + Sync {
    /// Evaluates `source` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns `EvalError` when the source does not parse or cannot be
    /// evaluated. `EvalError::UnknownIdentifier` marks a bare identifier that
    /// is not a story variable.
    fn evaluate(&self, source: &str, variables: &mut Variables) -> Result<Value, EvalError>;
}
