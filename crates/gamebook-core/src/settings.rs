//! Engine settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Timing and behaviour knobs for a story run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Duration of each fade in and fade out, in milliseconds.
    pub fade_ms: u64,
    /// Duration of a scroll, in milliseconds.
    pub scroll_ms: u64,
    /// Duration of the scene container resize, in milliseconds.
    pub resize_ms: u64,
    /// Duration of the one-off fade used when the story first appears.
    pub debut_fade_ms: u64,
    /// Container opacity while the debut fade runs.
    pub debut_opacity: f64,
    /// Story code used to key saved games.
    pub story_id: String,
    /// Whether series of three or more get a comma before the conjunction.
    pub use_oxford_comma: bool,
    /// Whether the host asks before the reader leaves.
    pub warn_when_leaving: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fade_ms: 300,
            scroll_ms: 300,
            resize_ms: 300,
            debut_fade_ms: 200,
            debut_opacity: 0.01,
            story_id: "story".to_owned(),
            use_oxford_comma: true,
            warn_when_leaving: true,
        }
    }
}

impl Settings {
    #[must_use]
    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }

    #[must_use]
    pub fn scroll(&self) -> Duration {
        Duration::from_millis(self.scroll_ms)
    }

    #[must_use]
    pub fn resize(&self) -> Duration {
        Duration::from_millis(self.resize_ms)
    }

    #[must_use]
    pub fn debut_fade(&self) -> Duration {
        Duration::from_millis(self.debut_fade_ms)
    }

    /// Applies `GAMEBOOK_*` overrides read through `lookup`.
    ///
    /// The binary passes `|key| std::env::var(key).ok()`.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Config` if a duration override is not a whole
    /// number of milliseconds or the story id is blank.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoryError> {
        for (key, slot) in [
            ("GAMEBOOK_FADE_MS", &mut self.fade_ms),
            ("GAMEBOOK_SCROLL_MS", &mut self.scroll_ms),
            ("GAMEBOOK_RESIZE_MS", &mut self.resize_ms),
        ] {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|e| StoryError::Config(format!("{key} must be a valid u64: {e}")))?;
            }
        }
        if let Some(story_id) = lookup("GAMEBOOK_STORY_ID") {
            let story_id = story_id.trim();
            if story_id.is_empty() {
                return Err(StoryError::Config("GAMEBOOK_STORY_ID must not be blank".into()));
            }
            story_id.clone_into(&mut self.story_id);
        }
        Ok(self)
    }
}
