//! Terminal stage.
//!
//! The whole scene is reprinted after every change, so everything counts as
//! on-screen and heights are measured in lines.

use std::io::{self, BufRead, Write};

use gamebook_core::stage::{Notice, Prompt, Stage};
use gamebook_document::{Document, NodeId};
use tracing::warn;

#[derive(Debug, Default)]
pub struct TerminalStage;

impl TerminalStage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[allow(clippy::cast_precision_loss)]
impl Stage for TerminalStage {
    fn natural_height(&self, doc: &Document, node: NodeId) -> f64 {
        doc.descendant_elements(node)
            .into_iter()
            .filter(|element| doc.is_visible(*element))
            .count() as f64
    }

    fn is_on_screen(&self, _doc: &Document, _node: NodeId) -> bool {
        true
    }

    fn offset_top(&self, _doc: &Document, _node: NodeId) -> f64 {
        0.0
    }

    fn confirm(&mut self, prompt: Prompt) -> bool {
        print!("{} [y/N] ", prompt.message());
        if let Err(error) = io::stdout().flush() {
            warn!(%error, "could not flush prompt");
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(error) => {
                warn!(%error, "could not read answer");
                false
            }
        }
    }

    fn notify(&mut self, notice: Notice) {
        println!("* {notice}");
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }
}
