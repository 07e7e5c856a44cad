//! Arena-backed document tree.
//!
//! Nodes live in a slot arena owned by [`Document`]. Destroying a node frees
//! its whole subtree and bumps the slot generation, so any [`NodeId`] still
//! held elsewhere simply stops resolving.


/// Handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name and ordered attributes.
    Element {
        /// Lowercase tag name.
        tag: String,
        /// Attributes in insertion order.
        attributes: Vec<(String, String)>,
    },
    /// A run of text.
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hidden: bool,
    logic: Option<bool>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            hidden: false,
            logic: None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A mutable tree of elements and text.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding a single `body` root element.
    #[must_use]
    pub fn new() -> Self {
        let mut document = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        document.root = document.create_element("body");
        document
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(Node::new(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.allocate(Node::new(NodeKind::Text(text.to_owned())))
    }

    /// Whether `id` still refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// The node's payload.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    /// Whether the node is a live element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Text of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// All attributes of an element, in insertion order.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Value of one attribute.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the element carries the attribute (even with an empty value).
    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Sets or overwrites an attribute. No-op on text or dead nodes.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(Node {
            kind: NodeKind::Element { attributes, .. },
            ..
        }) = self.node_mut(id)
        else {
            return;
        };
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => value.clone_into(existing),
            None => attributes.push((name.to_owned(), value.to_owned())),
        }
    }

    /// Removes an attribute if present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attributes, .. },
            ..
        }) = self.node_mut(id)
        {
            attributes.retain(|(key, _)| key != name);
        }
    }

    /// Whitespace-separated class names.
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(id, "class")
            .unwrap_or_default()
            .split_whitespace()
    }

    /// Whether the element has the class.
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|name| name == class)
    }

    /// Adds a class if missing.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if !self.is_element(id) || self.has_class(id, class) {
            return;
        }
        let mut classes: Vec<&str> = self.classes(id).collect();
        classes.push(class);
        let joined = classes.join(" ");
        self.set_attribute(id, "class", &joined);
    }

    /// Removes a class if present.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let joined = self
            .classes(id)
            .filter(|name| *name != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute(id, "class", &joined);
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of a node, text included.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Element children of a node.
    #[must_use]
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |node| self.parent(*node))
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|node| node == ancestor)
    }

    /// Elements below `id` in document order, `id` excluded.
    #[must_use]
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.is_element(node) {
                out.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// `id` followed by every element below it, in document order.
    #[must_use]
    pub fn subtree_elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.is_element(id) {
            out.push(id);
        }
        out.extend(self.descendant_elements(id));
        out
    }

    /// Unlinks a node from its parent without destroying it.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId, position: usize) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        if self.is_ancestor_of(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(parent) {
            let position = position.min(node.children.len());
            node.children.insert(position, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
    }

    fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, index))
    }

    /// Appends `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let position = self.children(parent).len();
        self.link(parent, child, position);
    }

    /// Inserts `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.link(parent, child, 0);
    }

    /// Inserts `new` right before `reference`. No-op if `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        if reference == new {
            return;
        }
        self.detach(new);
        if let Some((parent, index)) = self.index_in_parent(reference) {
            self.link(parent, new, index);
        }
    }

    /// Inserts `new` right after `reference`. No-op if `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        if reference == new {
            return;
        }
        self.detach(new);
        if let Some((parent, index)) = self.index_in_parent(reference) {
            self.link(parent, new, index + 1);
        }
    }

    /// Destroys a node and its subtree, unlinking it first.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.contains(id) || id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let slot = &mut self.slots[node.index as usize];
            if slot.generation != node.generation {
                continue;
            }
            if let Some(removed) = slot.node.take() {
                stack.extend(removed.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index);
            }
        }
    }

    /// Puts `new` where `old` is and destroys `old`.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.insert_before(old, new);
        self.destroy(old);
    }

    /// Destroys every child of `parent`.
    pub fn clear_children(&mut self, parent: NodeId) {
        for child in self.children(parent).to_vec() {
            self.destroy(child);
        }
    }

    /// Replaces the contents of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node);
        }
    }

    /// Concatenated text of the subtree.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            match self.kind(node) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(NodeKind::Element { .. }) => {
                    stack.extend(self.children(node).iter().rev().copied());
                }
                None => {}
            }
        }
        out
    }

    /// Deep-copies a subtree into a new detached node.
    ///
    /// Attributes and structure are copied; visibility and logic results are not.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let kind = self.kind(id)?.clone();
        let copy = self.allocate(Node::new(kind));
        for child in self.children(id).to_vec() {
            if let Some(child_copy) = self.deep_clone(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    /// Whether the node was explicitly hidden.
    #[must_use]
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| node.hidden)
    }

    /// Hides or shows a node.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.node_mut(id) {
            node.hidden = hidden;
        }
    }

    /// Logic result recorded on the element for the current load pass.
    #[must_use]
    pub fn logic(&self, id: NodeId) -> Option<bool> {
        self.node(id)?.logic
    }

    /// Records a logic result.
    pub fn set_logic(&mut self, id: NodeId, result: Option<bool>) {
        if let Some(node) = self.node_mut(id) {
            node.logic = result;
        }
    }

    /// Erases logic results on `id` and everything below it.
    pub fn clear_logic(&mut self, id: NodeId) {
        for node in self.subtree_elements(id) {
            self.set_logic(node, None);
        }
    }

    /// A node is visible when it is attached to the root and neither it nor
    /// any ancestor is hidden or resolved `false` by logic.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                return false;
            };
            if node.hidden || node.logic == Some(false) {
                return false;
            }
            if node_id == self.root {
                return true;
            }
            current = node.parent;
        }
        false
    }

    fn position_path(&self, id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some((parent, index)) = self.index_in_parent(current) {
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Sorts nodes into document order and drops duplicates and dead handles.
    pub fn sort_unique(&self, nodes: &mut Vec<NodeId>) {
        nodes.retain(|node| self.contains(*node));
        let mut keyed: Vec<(Vec<usize>, NodeId)> = nodes
            .iter()
            .map(|node| (self.position_path(*node), *node))
            .collect();
        keyed.sort();
        keyed.dedup_by(|a, b| a.1 == b.1);
        *nodes = keyed.into_iter().map(|(_, node)| node).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let list = doc.create_element("ul");
        let first = doc.create_element("li");
        let second = doc.create_element("li");
        doc.append_child(doc.root(), list);
        doc.append_child(list, first);
        doc.append_child(list, second);
        (doc, list, first, second)
    }

    #[test]
    fn test_destroyed_handles_stop_resolving_after_slot_reuse() {
        // Arrange
        let (mut doc, list, first, _) = sample();

        // Act
        doc.destroy(first);
        let reused = doc.create_element("p");

        // Assert
        assert!(!doc.contains(first));
        assert!(doc.contains(reused));
        assert_eq!(doc.element_children(list).len(), 1);
    }

    #[test]
    fn test_replace_with_keeps_position() {
        let (mut doc, list, first, second) = sample();
        let span = doc.create_element("span");

        doc.replace_with(first, span);

        assert_eq!(doc.children(list), &[span, second]);
        assert!(!doc.contains(first));
    }

    #[test]
    fn test_visibility_follows_hidden_ancestors_and_false_logic() {
        let (mut doc, list, first, second) = sample();
        assert!(doc.is_visible(first));

        doc.set_logic(second, Some(false));
        doc.set_hidden(list, true);

        assert!(!doc.is_visible(first));
        doc.set_hidden(list, false);
        assert!(doc.is_visible(first));
        assert!(!doc.is_visible(second));
    }

    #[test]
    fn test_detached_nodes_are_not_visible() {
        let mut doc = Document::new();
        let orphan = doc.create_element("div");
        assert!(!doc.is_visible(orphan));
    }

    #[test]
    fn test_class_editing() {
        let (mut doc, list, _, _) = sample();
        doc.add_class(list, "comma-series");
        doc.add_class(list, "or");
        doc.add_class(list, "or");
        assert_eq!(doc.attribute(list, "class"), Some("comma-series or"));

        doc.remove_class(list, "comma-series");
        assert_eq!(doc.attribute(list, "class"), Some("or"));
    }

    #[test]
    fn test_deep_clone_copies_structure_but_not_state() {
        let (mut doc, list, first, _) = sample();
        doc.set_attribute(first, "class", "item");
        doc.set_hidden(first, true);
        doc.set_logic(first, Some(true));

        let copy = doc.deep_clone(list).unwrap();

        let copied_items = doc.element_children(copy);
        assert_eq!(copied_items.len(), 2);
        assert_eq!(doc.attribute(copied_items[0], "class"), Some("item"));
        assert!(!doc.is_hidden(copied_items[0]));
        assert_eq!(doc.logic(copied_items[0]), None);
        assert_eq!(doc.parent(copy), None);
    }

    #[test]
    fn test_sort_unique_orders_by_document_position() {
        let (doc, list, first, second) = sample();
        let mut nodes = vec![second, first, list, second];

        doc.sort_unique(&mut nodes);

        assert_eq!(nodes, vec![list, first, second]);
    }

    #[test]
    fn test_cannot_link_a_node_into_its_own_subtree() {
        let (mut doc, list, first, _) = sample();
        doc.append_child(first, list);
        assert_eq!(doc.parent(list), Some(doc.root()));
    }
}
