//! Save store port.

use crate::error::StoryError;

/// String-keyed storage for saved games.
pub trait SaveStore: Send {
    /// Reads the value under `key`, or `None` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Persistence` if the backing storage fails.
    fn read(&self, key: &str) -> Result<Option<String>, StoryError>;

    /// Writes `value` under `key`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Persistence` if the backing storage fails.
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoryError>;

    /// Deletes `key`. Removing a key that was never written is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Persistence` if the backing storage fails.
    fn remove(&mut self, key: &str) -> Result<(), StoryError>;
}

/// The three keys a story's save occupies.
///
/// `variables` is written last and acts as the commit marker: a save without
/// it is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveKeys {
    pub variables: String,
    pub bookmarks: String,
    pub scene: String,
}

impl SaveKeys {
    /// Keys for the story identified by `code`.
    #[must_use]
    pub fn for_story(code: &str) -> Self {
        Self {
            variables: format!("{code}-variables"),
            bookmarks: format!("{code}-bookmarks"),
            scene: format!("{code}-scene"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_prefixed_with_story_code() {
        let keys = SaveKeys::for_story("cave");
        assert_eq!(keys.variables, "cave-variables");
        assert_eq!(keys.bookmarks, "cave-bookmarks");
        assert_eq!(keys.scene, "cave-scene");
    }
}
