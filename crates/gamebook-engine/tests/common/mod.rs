//! Shared test helpers for engine integration tests.
#![allow(dead_code)]

use gamebook_core::rng::DeterministicRng;
use gamebook_core::settings::Settings;
use gamebook_core::store::SaveStore;
use gamebook_document::{Document, ElementFragment, Fragment, NodeId, NodeKind};
use gamebook_engine::domain::canon::story_document;
use gamebook_engine::{Collaborators, StorySession, TransitionKind};
use gamebook_expression::ScriptEvaluator;
use gamebook_test_support::{MemorySaveStore, MockRng, ScriptedStage};

/// A started session plus handles on the mocks it was built with.
pub struct Harness {
    pub session: StorySession,
    pub stage: ScriptedStage,
    pub store: MemorySaveStore,
}

/// Starts `templates` with a confirming stage, an empty store and an RNG
/// that always picks the first alternative, then settles the debut.
pub fn start(templates: Vec<Fragment>) -> Harness {
    start_with(templates, ScriptedStage::new(), MemorySaveStore::new(), MockRng)
}

pub fn start_with(
    templates: Vec<Fragment>,
    stage: ScriptedStage,
    store: MemorySaveStore,
    rng: impl DeterministicRng + 'static,
) -> Harness {
    let mut session = start_session(
        story_document(&templates),
        stage.clone(),
        Box::new(store.clone()),
        Box::new(rng),
    )
    .unwrap();
    session.settle();
    Harness {
        session,
        stage,
        store,
    }
}

pub fn start_session(
    doc: Document,
    stage: ScriptedStage,
    store: Box<dyn SaveStore>,
    rng: Box<dyn DeterministicRng>,
) -> Result<StorySession, gamebook_core::StoryError> {
    let settings = Settings {
        story_id: "cave".to_owned(),
        ..Settings::default()
    };
    StorySession::start(
        doc,
        settings,
        Collaborators {
            stage: Box::new(stage),
            store,
            evaluator: Box::new(ScriptEvaluator),
            rng,
        },
    )
}

/// A template with the given class.
pub fn passage(class: &str) -> ElementFragment {
    ElementFragment::new("div").attr("class", class)
}

/// A link carrying one attribute.
pub fn link(label: &str, attribute: &str, value: &str) -> ElementFragment {
    ElementFragment::new("a").attr(attribute, value).child(label)
}

impl Harness {
    /// Clicks the visible link whose text is `label` and settles.
    pub fn click(&mut self, label: &str) {
        assert!(self.press(label), "`{label}` did not react");
        self.session.settle();
    }

    /// Clicks without finishing any transition.
    pub fn press(&mut self, label: &str) -> bool {
        let target = self.find_link(label);
        self.session.click(target)
    }

    pub fn find_link(&self, label: &str) -> NodeId {
        let doc = self.session.document();
        self.session
            .interactive_elements()
            .into_iter()
            .find(|node| doc.text_content(*node) == label)
            .unwrap_or_else(|| panic!("no link `{label}` in {:?}", self.visible_text()))
    }

    /// Text of the scene, skipping hidden content.
    pub fn visible_text(&self) -> String {
        let doc = self.session.document();
        let mut out = String::new();
        collect_visible(doc, self.session.scene(), &mut out);
        out
    }

    pub fn link_labels(&self) -> Vec<String> {
        let doc = self.session.document();
        self.session
            .interactive_elements()
            .into_iter()
            .map(|node| doc.text_content(node))
            .collect()
    }

    /// Finishes transitions the way a host would, batch by batch, and
    /// counts the resizes it was asked to animate.
    pub fn settle_counting_resizes(&mut self) -> usize {
        let mut resizes = 0;
        loop {
            let batch = self.session.drain_transitions();
            if batch.is_empty() {
                return resizes;
            }
            for transition in batch {
                if matches!(transition.kind, TransitionKind::Resize { .. }) {
                    resizes += 1;
                }
                self.session.finish(transition.ticket);
            }
        }
    }
}

fn collect_visible(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        Some(NodeKind::Text(text)) => out.push_str(text),
        Some(NodeKind::Element { .. }) => {
            if doc.is_hidden(node) || doc.logic(node) == Some(false) {
                return;
            }
            for child in doc.children(node) {
                collect_visible(doc, *child, out);
            }
        }
        None => {}
    }
}
