//! Saving and restoring progress.
//!
//! A save is three entries in the store, keyed by story code: the variables,
//! the bookmark selectors and the scene markup, each as JSON.

use gamebook_core::{StoryError, Variables};
use gamebook_core::stage::{Notice, Prompt};
use gamebook_core::store::SaveKeys;
use gamebook_document::Fragment;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

use super::session::StorySession;
use super::transition::Mutation;
use crate::domain::bookmarks::Bookmark;

/// A decoded save, validated before anything is touched.
#[derive(Debug)]
pub(crate) struct SaveData {
    variables: Variables,
    bookmarks: Vec<String>,
    scene: Vec<Fragment>,
}

impl StorySession {
    /// Writes the current progress. The reader is told unless `quiet`;
    /// failures are always reported.
    #[instrument(skip(self))]
    pub fn save(&mut self, quiet: bool) {
        match self.write_save() {
            Ok(()) => {
                info!(story_id = %self.settings.story_id, "story saved");
                if !quiet {
                    self.stage.notify(Notice::Saved);
                }
            }
            Err(error) => {
                warn!(%error, "could not save story");
                self.stage.notify(Notice::SaveFailed);
            }
        }
    }

    /// Restores the last save after asking the reader, unless `quiet`.
    ///
    /// Nothing changes when any part of the save is missing or unreadable.
    #[instrument(skip(self))]
    pub fn load(&mut self, quiet: bool) {
        if !quiet && !self.stage.confirm(Prompt::LoadSave) {
            return;
        }
        let data = match self.read_save() {
            Ok(data) => data,
            Err(error) => {
                info!(%error, "no usable save data");
                self.stage.notify(Notice::NoSaveData);
                return;
            }
        };
        info!(story_id = %self.settings.story_id, "loading saved story");
        self.scroll_to_top();
        self.lock();
        let children = self.doc.element_children(self.scene);
        self.fade_out_then(children, Mutation::Restore(Box::new(data)));
    }

    fn write_save(&mut self) -> Result<(), StoryError> {
        let keys = SaveKeys::for_story(&self.settings.story_id);
        let scene: Vec<Fragment> = self
            .doc
            .children(self.scene)
            .iter()
            .filter_map(|child| self.doc.export(*child))
            .collect();

        let variables = encode(&self.variables)?;
        let bookmarks = encode(&self.bookmarks.selectors())?;
        let scene = encode(&scene)?;

        // The variables key commits the save; drop it until the rest is down.
        self.store.remove(&keys.variables)?;
        self.store.write(&keys.scene, &scene)?;
        self.store.write(&keys.bookmarks, &bookmarks)?;
        self.store.write(&keys.variables, &variables)
    }

    fn read_save(&self) -> Result<SaveData, StoryError> {
        let keys = SaveKeys::for_story(&self.settings.story_id);
        Ok(SaveData {
            variables: self.decode(&keys.variables)?,
            bookmarks: self.decode(&keys.bookmarks)?,
            scene: self.decode(&keys.scene)?,
        })
    }

    fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoryError> {
        let raw = self
            .store
            .read(key)?
            .ok_or_else(|| StoryError::InvalidSave(format!("`{key}` is missing")))?;
        serde_json::from_str(&raw)
            .map_err(|error| StoryError::InvalidSave(format!("`{key}`: {error}")))
    }

    /// Swaps in a decoded save. Runs while the scene is locked and faded out.
    pub(crate) fn restore(&mut self, data: SaveData) {
        let SaveData {
            variables,
            bookmarks,
            scene,
        } = data;
        self.variables.replace(variables);

        let entries: Vec<Bookmark> = bookmarks
            .into_iter()
            .map(|selector| {
                if selector.is_empty() {
                    Bookmark::placeholder()
                } else {
                    Bookmark {
                        template: self.find_template(&selector),
                        selector,
                    }
                }
            })
            .collect();
        self.bookmarks.restore(entries);

        self.doc.clear_children(self.scene);
        for fragment in &scene {
            let node = self.doc.import(fragment);
            self.doc.append_child(self.scene, node);
        }
        for node in self.doc.element_children(self.scene) {
            self.resolve_logic(node);
        }
        self.format(self.scene);
        for node in self.doc.element_children(self.scene) {
            self.post_new(node, false);
        }
    }
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, StoryError> {
    serde_json::to_string(value).map_err(|error| StoryError::Persistence(error.to_string()))
}
