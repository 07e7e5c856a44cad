//! Error types.

use thiserror::Error;

/// Top-level story error type.
#[derive(Debug, Error)]
pub enum StoryError {
    /// The document has no `#canon` container.
    #[error("story has no canon container")]
    MissingCanon,

    /// The document has no `#scene` container.
    #[error("story has no scene container")]
    MissingScene,

    /// The canon holds nothing to start from.
    #[error("this story appears to be empty")]
    EmptyStory,

    /// A setting could not be read.
    #[error("configuration error: {0}")]
    Config(String),

    /// A save store could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Saved data exists but does not decode.
    #[error("invalid save data: {0}")]
    InvalidSave(String),
}

/// Why an expression produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The source was blank.
    #[error("empty expression")]
    Empty,

    /// A bare identifier that is not a story variable reference.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// The source does not parse.
    #[error("syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset of the problem.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// An operation on values that do not support it.
    #[error("type error: {0}")]
    Type(String),
}
