//! Story files.
//!
//! A story is a YAML document with an id, optional settings and the canon:
//!
//! ```yaml
//! id: cave
//! settings: { use_oxford_comma: false }
//! canon:
//!   - { tag: div, attrs: { class: start }, children: ["You wake in a cave."] }
//! ```

use std::path::Path;

use gamebook_core::StoryError;
use gamebook_core::settings::Settings;
use gamebook_document::{Document, Fragment};
use gamebook_engine::domain::canon::story_document;
use serde::Deserialize;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
pub struct StoryFile {
    /// Story code used to key saves. Overrides `settings.story_id`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub settings: Settings,
    pub canon: Vec<Fragment>,
}

impl StoryFile {
    /// Reads and parses a story file.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` if the file cannot be read and
    /// `CliError::StoryFile` if it is not a valid story.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parses a story from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `CliError::StoryFile` if the text is not a valid story.
    pub fn parse(raw: &str) -> Result<Self, CliError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The file's settings with its id applied, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Config` if an override is malformed.
    pub fn settings(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, StoryError> {
        let mut settings = self.settings.clone();
        if let Some(id) = self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            id.clone_into(&mut settings.story_id);
        }
        settings.with_env_overrides(lookup)
    }

    #[must_use]
    pub fn document(&self) -> Document {
        story_document(&self.canon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str = r#"
id: cave
settings:
  fade_ms: 10
canon:
  - tag: div
    attrs: { class: start }
    children:
      - "You wake in a cave."
      - { tag: a, attrs: { data-click: tunnel }, children: ["Crawl forward"] }
"#;

    #[test]
    fn test_parse_story_file() {
        let story = StoryFile::parse(STORY).unwrap();

        assert_eq!(story.id.as_deref(), Some("cave"));
        assert_eq!(story.canon.len(), 1);
        assert_eq!(story.settings.fade_ms, 10);
        assert_eq!(story.settings.resize_ms, 300);
    }

    #[test]
    fn test_id_then_env_override_story_id() {
        // Arrange
        let story = StoryFile::parse(STORY).unwrap();

        // Act
        let from_file = story.settings(|_| None).unwrap();
        let from_env = story
            .settings(|key| (key == "GAMEBOOK_STORY_ID").then(|| "lake".to_owned()))
            .unwrap();

        // Assert
        assert_eq!(from_file.story_id, "cave");
        assert_eq!(from_env.story_id, "lake");
    }

    #[test]
    fn test_story_without_canon_is_rejected() {
        let result = StoryFile::parse("id: cave\n");

        assert!(matches!(result, Err(CliError::StoryFile(_))));
    }

    #[test]
    fn test_document_holds_canon_and_scene() {
        let story = StoryFile::parse(STORY).unwrap();

        let doc = story.document();

        assert_eq!(doc.element_children(doc.root()).len(), 2);
    }
}
