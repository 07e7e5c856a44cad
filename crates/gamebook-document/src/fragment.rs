//! Serializable subtrees.
//!
//! Fragments are how stories are authored and how the live scene is saved.
//! A fragment is either a bare string (text) or an element map:
//!
//! ```yaml
//! tag: div
//! attrs: { class: start }
//! children:
//!   - "You wake in a cave."
//!   - { tag: a, attrs: { data-click: tunnel }, children: ["Crawl forward"] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, NodeId, NodeKind};

/// A text run or an element subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    /// Plain text.
    Text(String),
    /// An element.
    Element(ElementFragment),
}

/// An element subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementFragment {
    /// Tag name.
    pub tag: String,
    /// Attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Child fragments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Fragment>,
    /// Whether the element is currently hidden.
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl ElementFragment {
    /// Starts an element fragment.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            ..Self::default()
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Adds a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Fragment>) -> Self {
        self.children.push(child.into());
        self
    }
}

impl From<ElementFragment> for Fragment {
    fn from(element: ElementFragment) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl Document {
    /// Builds a detached subtree from a fragment.
    pub fn import(&mut self, fragment: &Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.create_text(text),
            Fragment::Element(element) => {
                let node = self.create_element(&element.tag);
                for (name, value) in &element.attrs {
                    self.set_attribute(node, name, value);
                }
                self.set_hidden(node, element.hidden);
                for child in &element.children {
                    let child = self.import(child);
                    self.append_child(node, child);
                }
                node
            }
        }
    }

    /// Captures a subtree as a fragment.
    ///
    /// Logic results belong to the pass that computed them and are left out.
    #[must_use]
    pub fn export(&self, id: NodeId) -> Option<Fragment> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(Fragment::Text(text.clone())),
            NodeKind::Element { tag, attributes } => Some(Fragment::Element(ElementFragment {
                tag: tag.clone(),
                attrs: attributes.iter().cloned().collect(),
                children: self
                    .children(id)
                    .iter()
                    .filter_map(|child| self.export(*child))
                    .collect(),
                hidden: self.is_hidden(id),
            })),
        }
    }
}
