//! Rendering surface port.
//!
//! The engine never draws anything. It asks the stage for measurements and
//! routes prompts and notices through it.

use std::fmt;

use gamebook_document::{Document, NodeId};

/// A yes/no question put to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Restart from the beginning.
    RestartStory,
    /// Replace progress with the saved game.
    LoadSave,
    /// Quit the player.
    LeaveStory,
}

impl Prompt {
    /// Text shown to the reader.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::RestartStory => "Abandon your current progress and restart this story?",
            Self::LoadSave => "Abandon your current progress to load the most recent save data?",
            Self::LeaveStory => {
                "Any unsaved story progress will be lost if you close or reload this page."
            }
        }
    }
}

/// An informational message for the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    StoryEmpty,
    NotWrittenYet,
    CannotGoBack,
    NoSaveData,
    Saved,
    SaveFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StoryEmpty => "This story appears to be empty.",
            Self::NotWrittenYet => "That part of the story hasn't been written yet.",
            Self::CannotGoBack => "This is as far back as you can go.",
            Self::NoSaveData => "No save data exists for this story.",
            Self::Saved => "Game saved.",
            Self::SaveFailed => "The game could not be saved.",
        })
    }
}

/// Measurements and dialogs provided by the host.
pub trait Stage: Send {
    /// Height the subtree at `node` would occupy with no height override.
    fn natural_height(&self, doc: &Document, node: NodeId) -> f64;

    /// Whether `node` is at least partly within the viewport.
    fn is_on_screen(&self, doc: &Document, node: NodeId) -> bool;

    /// Vertical page offset of `node`.
    fn offset_top(&self, doc: &Document, node: NodeId) -> f64;

    /// Asks the reader a yes/no question.
    fn confirm(&mut self, prompt: Prompt) -> bool;

    /// Shows the reader a message.
    fn notify(&mut self, notice: Notice);
}
