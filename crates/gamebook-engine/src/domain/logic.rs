//! If / else-if / else chains.
//!
//! Results live on the nodes for the length of one load pass. An element
//! that resolves `false` is not shown and none of its other actions run.

use gamebook_document::{Document, NodeId};

pub const LOGIC_IF: &str = "data-logic-if";
pub const LOGIC_ELSE_IF: &str = "data-logic-elseif";
pub const LOGIC_ELSE: &str = "data-logic-else";

/// The branch an element declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    If(String),
    ElseIf(String),
    Else,
}

impl Condition {
    /// Reads the branch from an element's attributes. `if` wins over
    /// `elseif`, which wins over `else`.
    #[must_use]
    pub fn of(doc: &Document, node: NodeId) -> Option<Self> {
        if let Some(source) = doc.attribute(node, LOGIC_IF) {
            Some(Self::If(source.to_owned()))
        } else if let Some(source) = doc.attribute(node, LOGIC_ELSE_IF) {
            Some(Self::ElseIf(source.to_owned()))
        } else if doc.has_attribute(node, LOGIC_ELSE) {
            Some(Self::Else)
        } else {
            None
        }
    }
}

/// Computes the logic result for `node` in a pass rooted at `pass_root`.
///
/// `evaluate` turns a condition into a boolean; it is only called when the
/// chain actually needs the condition. Returns `None` for elements that take
/// no part in a chain.
pub fn resolve(
    doc: &Document,
    node: NodeId,
    pass_root: NodeId,
    mut evaluate: impl FnMut(&str) -> bool,
) -> Option<bool> {
    if inside_false_branch(doc, node, pass_root) {
        return Some(false);
    }
    match Condition::of(doc, node)? {
        Condition::If(source) => Some(evaluate(&source)),
        Condition::ElseIf(source) => {
            Some(!had_true_sibling(doc, node) && evaluate(&source))
        }
        Condition::Else => Some(!had_true_sibling(doc, node)),
    }
}

/// Whether an ancestor within the pass already resolved `false`.
fn inside_false_branch(doc: &Document, node: NodeId, pass_root: NodeId) -> bool {
    if node == pass_root {
        return false;
    }
    for ancestor in doc.ancestors(node) {
        if doc.logic(ancestor) == Some(false) {
            return true;
        }
        if ancestor == pass_root {
            break;
        }
    }
    false
}

/// Whether any earlier sibling element resolved `true`.
fn had_true_sibling(doc: &Document, node: NodeId) -> bool {
    let Some(parent) = doc.parent(node) else {
        return false;
    };
    doc.element_children(parent)
        .into_iter()
        .take_while(|sibling| *sibling != node)
        .any(|sibling| doc.logic(sibling) == Some(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(doc: &mut Document, branches: &[(&str, &str)]) -> (NodeId, Vec<NodeId>) {
        let parent = doc.create_element("div");
        doc.append_child(doc.root(), parent);
        let nodes = branches
            .iter()
            .map(|(attribute, source)| {
                let node = doc.create_element("p");
                doc.set_attribute(node, attribute, source);
                doc.append_child(parent, node);
                node
            })
            .collect();
        (parent, nodes)
    }

    fn run(doc: &mut Document, root: NodeId, nodes: &[NodeId]) -> Vec<Option<bool>> {
        for node in nodes {
            let result = resolve(doc, *node, root, |source| source == "yes");
            doc.set_logic(*node, result);
        }
        nodes.iter().map(|node| doc.logic(*node)).collect()
    }

    #[test]
    fn test_first_true_branch_wins() {
        // Arrange
        let mut doc = Document::new();
        let (parent, nodes) = chain(
            &mut doc,
            &[
                (LOGIC_IF, "no"),
                (LOGIC_ELSE_IF, "yes"),
                (LOGIC_ELSE_IF, "yes"),
                (LOGIC_ELSE, ""),
            ],
        );

        // Act
        let results = run(&mut doc, parent, &nodes);

        // Assert
        assert_eq!(
            results,
            vec![Some(false), Some(true), Some(false), Some(false)]
        );
    }

    #[test]
    fn test_else_without_true_sibling_is_true() {
        let mut doc = Document::new();
        let (parent, nodes) = chain(&mut doc, &[(LOGIC_IF, "no"), (LOGIC_ELSE, "")]);

        assert_eq!(run(&mut doc, parent, &nodes), vec![Some(false), Some(true)]);
    }

    #[test]
    fn test_degenerate_chain_behaves_as_if_no_true_sibling() {
        let mut doc = Document::new();
        let (parent, nodes) = chain(&mut doc, &[(LOGIC_ELSE_IF, "yes"), (LOGIC_ELSE, "")]);

        assert_eq!(run(&mut doc, parent, &nodes), vec![Some(true), Some(false)]);
    }

    #[test]
    fn test_descendants_of_false_branch_are_forced_false() {
        let mut doc = Document::new();
        let (parent, nodes) = chain(&mut doc, &[(LOGIC_IF, "no")]);
        let inner = doc.create_element("span");
        doc.set_attribute(inner, LOGIC_IF, "yes");
        doc.append_child(nodes[0], inner);

        let results = run(&mut doc, parent, &[nodes[0], inner]);

        assert_eq!(results, vec![Some(false), Some(false)]);
    }

    #[test]
    fn test_false_result_outside_the_pass_is_ignored() {
        let mut doc = Document::new();
        let (_, nodes) = chain(&mut doc, &[(LOGIC_IF, "no")]);
        doc.set_logic(nodes[0], Some(false));
        let inner = doc.create_element("span");
        doc.set_attribute(inner, LOGIC_IF, "yes");
        doc.append_child(nodes[0], inner);

        let results = run(&mut doc, inner, &[inner]);

        assert_eq!(results, vec![Some(true)]);
    }

    #[test]
    fn test_plain_element_has_no_result() {
        let mut doc = Document::new();
        let node = doc.create_element("p");
        doc.append_child(doc.root(), node);

        assert_eq!(resolve(&doc, node, node, |_| true), None);
    }
}
