//! Comma-series formatting.
//!
//! Inline lists marked `comma-series` get separator classes on their visible
//! children so a renderer can join them as "a, b, and c". Lists that also
//! carry the `or` class use "or" as the conjunction.

use crate::document::{Document, NodeId};

const SERIES_CLASSES: [&str; 5] = [
    "series-add-comma",
    "series-add-and",
    "series-add-or",
    "series-add-comma-and",
    "series-add-comma-or",
];

/// Applies separator classes to every visible `comma-series` list below `root`.
pub fn comma_series(doc: &mut Document, root: NodeId, oxford: bool) {
    let lists: Vec<NodeId> = doc
        .descendant_elements(root)
        .into_iter()
        .filter(|node| doc.has_class(*node, "comma-series") && doc.is_visible(*node))
        .collect();
    for list in lists {
        format_series(doc, list, oxford);
    }
}

fn format_series(doc: &mut Document, list: NodeId, oxford: bool) {
    let children = doc.element_children(list);
    for child in &children {
        for class in SERIES_CLASSES {
            doc.remove_class(*child, class);
        }
    }
    let visible: Vec<NodeId> = children
        .into_iter()
        .filter(|child| doc.is_visible(*child))
        .collect();
    let conjunction = if doc.has_class(list, "or") { "or" } else { "and" };
    match visible.as_slice() {
        [] | [_] => {}
        [first, _] => doc.add_class(*first, &format!("series-add-{conjunction}")),
        [leading @ .., next_to_last, _] => {
            for item in leading {
                doc.add_class(*item, "series-add-comma");
            }
            let class = if oxford {
                format!("series-add-comma-{conjunction}")
            } else {
                format!("series-add-{conjunction}")
            };
            doc.add_class(*next_to_last, &class);
        }
    }
}
