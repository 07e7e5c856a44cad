//! Flexible selector resolution.
//!
//! Story attributes name their targets loosely: `hall; Variables.exit; ^^`
//! means "elements with class `hall`, whatever the `exit` variable names, and
//! the grandparent of the element that triggered the action". Each token
//! resolves on its own and the results are unioned in document order.

use gamebook_core::{Value, Variables};
use gamebook_document::{Document, NodeId, Selector};
use tracing::debug;

const VARIABLE_PREFIX: &str = "Variables.";

/// Resolves flexible selector strings against one document.
#[derive(Debug, Clone, Copy)]
pub struct SelectorResolver<'a> {
    doc: &'a Document,
    variables: &'a Variables,
    scene: NodeId,
}

impl<'a> SelectorResolver<'a> {
    #[must_use]
    pub fn new(doc: &'a Document, variables: &'a Variables, scene: NodeId) -> Self {
        Self {
            doc,
            variables,
            scene,
        }
    }

    /// Every element below `scope` matched by `source`.
    ///
    /// `anchor` is the element `^` tokens ascend from. Unresolvable tokens
    /// contribute nothing.
    #[must_use]
    pub fn find(&self, scope: NodeId, source: &str, anchor: Option<NodeId>) -> Vec<NodeId> {
        let mut results = Vec::new();
        for token in self.expand(source) {
            if !token.is_empty() && token.chars().all(|c| c == '^') {
                results.extend(self.ascend(anchor, token.len()));
                continue;
            }
            let mut found_as_class = false;
            if !token.contains([' ', '.']) {
                if let Ok(selector) = Selector::parse(&format!(".{token}")) {
                    let matches = self.doc.select(scope, &selector);
                    found_as_class = !matches.is_empty();
                    results.extend(matches);
                }
            }
            if found_as_class {
                continue;
            }
            match Selector::parse(&token) {
                Ok(selector) => results.extend(self.doc.select(scope, &selector)),
                Err(error) => debug!(%token, %error, "ignoring invalid selector"),
            }
        }
        self.doc.sort_unique(&mut results);
        results
    }

    /// Splits on `;` and replaces `Variables.name` tokens with the tokens of
    /// that variable's text. Only one level of indirection is followed.
    fn expand(&self, source: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for token in split_tokens(source) {
            if token.starts_with(VARIABLE_PREFIX) {
                if let Some(Value::Text(text)) = self.variables.get(token) {
                    tokens.extend(split_tokens(text).map(str::to_owned));
                }
            } else {
                tokens.push(token.to_owned());
            }
        }
        tokens
    }

    /// Walks up `levels` parents from `anchor`. Reaching the scene container
    /// yields its top-level children; leaving the scene yields nothing.
    fn ascend(&self, anchor: Option<NodeId>, levels: usize) -> Vec<NodeId> {
        let mut current = anchor;
        let mut remaining = levels;
        loop {
            let Some(node) = current.filter(|node| self.doc.contains(*node)) else {
                return Vec::new();
            };
            if node == self.scene {
                return self.doc.element_children(self.scene);
            }
            if !self.doc.is_ancestor_of(self.scene, node) {
                return Vec::new();
            }
            if remaining == 0 {
                return vec![node];
            }
            current = self.doc.parent(node);
            remaining -= 1;
        }
    }
}

fn split_tokens(source: &str) -> impl Iterator<Item = &str> {
    source.split(';').map(str::trim).filter(|token| !token.is_empty())
}
