//! Bookmark history for backward navigation.

use gamebook_document::{Document, NodeId};

pub const LOAD_NO_BOOKMARK: &str = "data-load-nobookmark";
pub const NO_BOOKMARK: &str = "data-nobookmark";

/// One visited template and the selector that reached it.
///
/// Templates that opted out of history are stored as placeholders with no
/// template and an empty selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub template: Option<NodeId>,
    pub selector: String,
}

impl Bookmark {
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            template: None,
            selector: String::new(),
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.template.is_none()
    }
}

/// Where going back leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    /// Nothing to pop: at most one entry is recorded.
    AtStart,
    /// Popped; this template is the new top.
    To(NodeId),
    /// Popped, but only placeholders were left and they were trimmed away.
    Emptied,
}

/// Stack of visited templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmarks {
    entries: Vec<Bookmark>,
}

impl Bookmarks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a template opted out of history.
    #[must_use]
    pub fn opts_out(doc: &Document, template: NodeId) -> bool {
        doc.has_attribute(template, LOAD_NO_BOOKMARK) || doc.has_attribute(template, NO_BOOKMARK)
    }

    /// Records a visit. Revisiting the template on top of the stack records
    /// nothing.
    pub fn push(&mut self, template: NodeId, selector: &str, opted_out: bool) {
        if self
            .entries
            .last()
            .is_some_and(|last| last.template == Some(template))
        {
            return;
        }
        self.entries.push(if opted_out {
            Bookmark::placeholder()
        } else {
            Bookmark {
                template: Some(template),
                selector: selector.to_owned(),
            }
        });
    }

    /// Pops the current entry and any placeholders beneath it.
    pub fn back(&mut self) -> Retreat {
        if self.entries.len() <= 1 {
            return Retreat::AtStart;
        }
        self.entries.pop();
        while self.entries.last().is_some_and(Bookmark::is_placeholder) {
            self.entries.pop();
        }
        match self.entries.last().and_then(|last| last.template) {
            Some(template) => Retreat::To(template),
            None => Retreat::Emptied,
        }
    }

    /// Forgets history, optionally keeping the current entry.
    pub fn reset(&mut self, keep_current: bool) {
        let current = if keep_current {
            self.entries.pop()
        } else {
            None
        };
        self.entries.clear();
        self.entries.extend(current);
    }

    /// Replaces the whole history.
    pub fn restore(&mut self, entries: Vec<Bookmark>) {
        self.entries = entries;
    }

    /// Selectors in push order; placeholders contribute empty strings.
    #[must_use]
    pub fn selectors(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.selector.clone())
            .collect()
    }

    #[must_use]
    pub fn entries(&self) -> &[Bookmark] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(count: usize) -> Vec<NodeId> {
        let mut doc = Document::new();
        (0..count).map(|_| doc.create_element("div")).collect()
    }

    #[test]
    fn test_revisiting_top_is_not_recorded() {
        let t = templates(2);
        let mut bookmarks = Bookmarks::new();

        bookmarks.push(t[0], "a", false);
        bookmarks.push(t[0], "a", false);
        bookmarks.push(t[1], "b", false);
        bookmarks.push(t[0], "a", false);

        assert_eq!(bookmarks.selectors(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_placeholders_are_trimmed_when_going_back() {
        // Arrange
        let t = templates(2);
        let mut bookmarks = Bookmarks::new();
        bookmarks.push(t[0], "a", false);
        bookmarks.push(t[1], "b", true);
        bookmarks.push(t[0], "a", false);

        // Act
        let retreat = bookmarks.back();

        // Assert
        assert_eq!(retreat, Retreat::To(t[0]));
        assert_eq!(bookmarks.selectors(), vec!["a"]);
    }

    #[test]
    fn test_back_from_opted_out_entry() {
        let t = templates(2);
        let mut bookmarks = Bookmarks::new();
        bookmarks.push(t[0], "a", false);
        bookmarks.push(t[1], "b", true);

        assert_eq!(bookmarks.back(), Retreat::To(t[0]));
    }

    #[test]
    fn test_back_with_single_entry_is_at_start() {
        let t = templates(1);
        let mut bookmarks = Bookmarks::new();
        bookmarks.push(t[0], "a", false);

        assert_eq!(bookmarks.back(), Retreat::AtStart);
        assert_eq!(bookmarks.len(), 1);
    }

    #[test]
    fn test_back_onto_only_placeholders_empties() {
        let t = templates(2);
        let mut bookmarks = Bookmarks::new();
        bookmarks.push(t[0], "a", true);
        bookmarks.push(t[1], "b", false);

        assert_eq!(bookmarks.back(), Retreat::Emptied);
        assert!(bookmarks.is_empty());
    }

    #[test]
    fn test_reset_keeping_current() {
        let t = templates(2);
        let mut bookmarks = Bookmarks::new();
        bookmarks.push(t[0], "a", false);
        bookmarks.push(t[1], "b", false);

        bookmarks.reset(true);

        assert_eq!(bookmarks.selectors(), vec!["b"]);
    }
}
