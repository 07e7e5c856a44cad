//! Save stores for persistence tests: a shared in-memory map and one that
//! breaks partway through a save.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use gamebook_core::StoryError;
use gamebook_core::store::SaveStore;

/// A save store held in memory. Clones share the same entries, so a test can
/// keep a handle after boxing one into a session.
#[derive(Debug, Clone, Default)]
pub struct MemorySaveStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemorySaveStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Overwrites `key` directly, e.g. to plant corrupt save data.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    /// Number of stored keys.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Deletes `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SaveStore for MemorySaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoryError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoryError> {
        self.insert(key, value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoryError> {
        self.delete(key);
        Ok(())
    }
}

/// A save store whose disk gives out. Without a backing store every call
/// fails; [`FailingSaveStore::after_writes`] lets a few writes through first.
#[derive(Debug, Default)]
pub struct FailingSaveStore {
    backing: Option<MemorySaveStore>,
    writes_left: usize,
}

impl FailingSaveStore {
    /// A store where every call fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes reads, removals and the first `writes` writes to `backing`,
    /// then fails every later write.
    #[must_use]
    pub fn after_writes(backing: MemorySaveStore, writes: usize) -> Self {
        Self {
            backing: Some(backing),
            writes_left: writes,
        }
    }

    fn backing(&mut self) -> Result<&mut MemorySaveStore, StoryError> {
        self.backing.as_mut().ok_or_else(unavailable)
    }
}

fn unavailable() -> StoryError {
    StoryError::Persistence("disk unavailable".into())
}

impl SaveStore for FailingSaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoryError> {
        self.backing.as_ref().ok_or_else(unavailable)?.read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoryError> {
        if self.writes_left == 0 {
            return Err(unavailable());
        }
        self.writes_left -= 1;
        self.backing()?.write(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoryError> {
        self.backing()?.remove(key)
    }
}
