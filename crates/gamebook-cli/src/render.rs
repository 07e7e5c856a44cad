//! Plain-text rendering of the scene.
//!
//! Block elements start new lines, links are numbered in document order and
//! comma-series classes become separators.

use gamebook_document::{Document, NodeId, NodeKind};
use gamebook_engine::StorySession;

const BLOCK_TAGS: [&str; 14] = [
    "div", "p", "section", "article", "header", "footer", "ul", "ol", "li", "h1", "h2", "h3",
    "h4", "blockquote",
];

const SEPARATORS: [(&str, &str); 5] = [
    ("series-add-comma-and", ", and "),
    ("series-add-comma-or", ", or "),
    ("series-add-comma", ", "),
    ("series-add-and", " and "),
    ("series-add-or", " or "),
];

/// What the reader sees: the scene text and the links it numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub text: String,
    /// Link `n` is `links[n - 1]`.
    pub links: Vec<NodeId>,
}

#[must_use]
pub fn render(session: &StorySession) -> Page {
    render_scene(
        session.document(),
        session.scene(),
        session.interactive_elements(),
    )
}

/// Renders the visible content under `scene`, numbering `links`.
#[must_use]
pub fn render_scene(doc: &Document, scene: NodeId, links: Vec<NodeId>) -> Page {
    let mut text = String::new();
    for child in doc.children(scene) {
        write_node(doc, *child, &links, &mut text);
    }
    Page {
        text: tidy(&text),
        links,
    }
}

fn write_node(doc: &Document, node: NodeId, links: &[NodeId], out: &mut String) {
    match doc.kind(node) {
        Some(NodeKind::Text(text)) => out.push_str(text),
        Some(NodeKind::Element { tag, .. }) => {
            if doc.is_hidden(node) || doc.logic(node) == Some(false) {
                return;
            }
            let block = BLOCK_TAGS.contains(&tag.as_str());
            if block {
                out.push('\n');
            }
            for child in doc.children(node) {
                write_node(doc, *child, links, out);
            }
            if let Some(index) = links.iter().position(|link| *link == node) {
                out.push_str(&format!(" [{}]", index + 1));
            }
            if let Some((_, separator)) = SEPARATORS
                .iter()
                .find(|(class, _)| doc.has_class(node, class))
            {
                out.push_str(separator);
            }
            if block {
                out.push('\n');
            }
        }
        None => {}
    }
}

/// Trims every line and drops blank ones.
fn tidy(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
