//! Test stage — a scripted `Stage` that records what the reader was shown.

use std::sync::{Arc, Mutex};

use gamebook_core::stage::{Notice, Prompt, Stage};
use gamebook_document::{Document, NodeId};

/// Height every visible element contributes.
pub const LINE_HEIGHT: f64 = 20.0;

#[derive(Debug, Default)]
struct Log {
    notices: Vec<Notice>,
    prompts: Vec<Prompt>,
}

/// A stage with fixed answers and a shared log of notices and prompts.
///
/// Heights are `LINE_HEIGHT` per visible element, offsets are `LINE_HEIGHT`
/// per element before the node in document order.
#[derive(Debug, Clone)]
pub struct ScriptedStage {
    log: Arc<Mutex<Log>>,
    answer: bool,
    on_screen: bool,
}

impl Default for ScriptedStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedStage {
    /// A stage that confirms every prompt and reports everything on-screen.
    #[must_use]
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Log::default())),
            answer: true,
            on_screen: true,
        }
    }

    /// Answers "no" to every prompt.
    #[must_use]
    pub fn declining(mut self) -> Self {
        self.answer = false;
        self
    }

    /// Reports every node as off-screen, so scrolls are emitted.
    #[must_use]
    pub fn off_screen(mut self) -> Self {
        self.on_screen = false;
        self
    }

    /// Notices shown so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.log.lock().unwrap().notices.clone()
    }

    /// Prompts asked so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        self.log.lock().unwrap().prompts.clone()
    }
}

#[allow(clippy::cast_precision_loss)]
fn lines(count: usize) -> f64 {
    count as f64 * LINE_HEIGHT
}

impl Stage for ScriptedStage {
    fn natural_height(&self, doc: &Document, node: NodeId) -> f64 {
        lines(
            doc.descendant_elements(node)
                .into_iter()
                .filter(|element| doc.is_visible(*element))
                .count(),
        )
    }

    fn is_on_screen(&self, _doc: &Document, _node: NodeId) -> bool {
        self.on_screen
    }

    fn offset_top(&self, doc: &Document, node: NodeId) -> f64 {
        lines(
            doc.descendant_elements(doc.root())
                .into_iter()
                .take_while(|element| *element != node)
                .count(),
        )
    }

    fn confirm(&mut self, prompt: Prompt) -> bool {
        self.log.lock().unwrap().prompts.push(prompt);
        self.answer
    }

    fn notify(&mut self, notice: Notice) {
        self.log.lock().unwrap().notices.push(notice);
    }
}
