//! The canon: the read-only template library scenes are cloned from.

use gamebook_core::StoryError;
use gamebook_document::{Document, ElementFragment, Fragment, NodeId};

use super::selector::SelectorResolver;

/// Id of the container holding every template.
pub const CANON_ID: &str = "canon";
/// Id of the container holding the live scene.
pub const SCENE_ID: &str = "scene";

/// Handle to the canon container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canon {
    root: NodeId,
}

impl Canon {
    /// Finds the `#canon` container.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::MissingCanon` if the document has none.
    pub fn locate(doc: &Document) -> Result<Self, StoryError> {
        find_by_id(doc, CANON_ID)
            .map(|root| Self { root })
            .ok_or(StoryError::MissingCanon)
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// First template matching a flexible selector.
    #[must_use]
    pub fn find(&self, resolver: &SelectorResolver<'_>, selector: &str) -> Option<NodeId> {
        resolver.find(self.root, selector, None).into_iter().next()
    }

    /// Independent deep copy of a template, ready for insertion into the
    /// scene. Cloning nothing yields nothing.
    pub fn clone_template(doc: &mut Document, template: Option<NodeId>) -> Option<NodeId> {
        doc.deep_clone(template?)
    }
}

/// Finds the `#scene` container.
///
/// # Errors
///
/// Returns `StoryError::MissingScene` if the document has none.
pub fn locate_scene(doc: &Document) -> Result<NodeId, StoryError> {
    find_by_id(doc, SCENE_ID).ok_or(StoryError::MissingScene)
}

fn find_by_id(doc: &Document, id: &str) -> Option<NodeId> {
    doc.descendant_elements(doc.root())
        .into_iter()
        .find(|node| doc.attribute(*node, "id") == Some(id))
}

/// Builds a story document: the authored templates inside a hidden `#canon`,
/// followed by an empty `#scene`.
#[must_use]
pub fn story_document(templates: &[Fragment]) -> Document {
    let mut canon = ElementFragment::new("section").attr("id", CANON_ID);
    canon.hidden = true;
    canon.children = templates.to_vec();
    let scene = ElementFragment::new("div").attr("id", SCENE_ID);

    let mut doc = Document::new();
    let body = doc.root();
    for fragment in [Fragment::from(canon), Fragment::from(scene)] {
        let node = doc.import(&fragment);
        doc.append_child(body, node);
    }
    doc
}
