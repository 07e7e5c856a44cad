//! JSON file save store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use gamebook_core::StoryError;
use gamebook_core::store::SaveStore;
use tracing::debug;

/// Keeps every save key in one JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    path: PathBuf,
}

impl FileSaveStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn entries(&self) -> Result<BTreeMap<String, String>, StoryError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                StoryError::Persistence(format!("{}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoryError::Persistence(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoryError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StoryError::Persistence(e.to_string()))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| StoryError::Persistence(format!("{}: {e}", self.path.display())))
    }
}

impl SaveStore for FileSaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoryError> {
        Ok(self.entries()?.remove(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoryError> {
        let mut entries = self.entries()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)?;
        debug!(path = %self.path.display(), key, "wrote save entry");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoryError> {
        let mut entries = self.entries()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
            debug!(path = %self.path.display(), key, "removed save entry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "gamebook-{name}-{}.save.json",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let store = FileSaveStore::new(scratch("missing"));

        assert_eq!(store.read("cave-scene").unwrap(), None);
    }

    #[test]
    fn test_write_then_read_keeps_other_keys() {
        // Arrange
        let path = scratch("write");
        let mut store = FileSaveStore::new(&path);

        // Act
        store.write("cave-variables", "{}").unwrap();
        store.write("cave-bookmarks", "[]").unwrap();

        // Assert
        let reopened = FileSaveStore::new(&path);
        assert_eq!(reopened.read("cave-variables").unwrap().as_deref(), Some("{}"));
        assert_eq!(reopened.read("cave-bookmarks").unwrap().as_deref(), Some("[]"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_remove_drops_only_that_key() {
        // Arrange
        let path = scratch("remove");
        let mut store = FileSaveStore::new(&path);
        store.write("cave-variables", "{}").unwrap();
        store.write("cave-scene", "[]").unwrap();

        // Act
        store.remove("cave-variables").unwrap();
        store.remove("cave-bookmarks").unwrap();

        // Assert
        let reopened = FileSaveStore::new(&path);
        assert_eq!(reopened.read("cave-variables").unwrap(), None);
        assert_eq!(reopened.read("cave-scene").unwrap().as_deref(), Some("[]"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_persistence_error() {
        let path = scratch("corrupt");
        std::fs::write(&path, "not json").unwrap();
        let store = FileSaveStore::new(&path);

        let result = store.read("cave-scene");

        assert!(matches!(result, Err(StoryError::Persistence(_))));
        std::fs::remove_file(path).unwrap();
    }
}
