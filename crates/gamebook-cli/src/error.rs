//! Gamebook player — startup and runtime errors.

use gamebook_core::StoryError;
use thiserror::Error;

/// Errors that end the player.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required argument or environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The story file could not be parsed.
    #[error("story file error: {0}")]
    StoryFile(#[from] serde_yaml::Error),

    /// The story could not be started.
    #[error("story error: {0}")]
    Story(#[from] StoryError),

    /// Terminal or file I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A timer or input task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}
