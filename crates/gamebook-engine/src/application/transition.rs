//! Scene transitions.
//!
//! Visual changes are never performed here. The controller emits
//! [`Transition`]s for the host to animate and parks the work that must
//! follow each one under its [`Ticket`]. The host reports completion with
//! [`StorySession::finish`], or calls [`StorySession::settle`] to complete
//! everything at once.
//!
//! Nested mutations share one lock counter. Only the outermost unlock
//! resizes the scene and fades the new content in.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use gamebook_core::settings::Settings;
use gamebook_core::stage::{Notice, Stage};
use gamebook_document::format::comma_series;
use gamebook_document::{Document, NodeId};
use tracing::{debug, info, warn};

use super::persistence::SaveData;
use super::session::StorySession;
use crate::domain::actions::{CLICK_ACTION_CLASS, Placement, is_interactive};
use crate::domain::bookmarks::Bookmarks;
use crate::domain::canon::Canon;

/// Identifies one emitted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// What the host should animate.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionKind {
    /// Fade these nodes out. They are hidden once the transition finishes.
    FadeOut { nodes: Vec<NodeId> },
    /// Fade these nodes in. They are already marked visible.
    FadeIn { nodes: Vec<NodeId> },
    /// Animate the scene height.
    Resize { from: f64, to: f64 },
    /// Scroll the page to a vertical offset.
    Scroll { to: f64 },
    /// Fade the whole scene container to an opacity.
    ContainerFade { opacity: f64 },
}

/// A timed visual change waiting for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub ticket: Ticket,
    pub kind: TransitionKind,
    pub duration: Duration,
}

/// Scene edits that wait for a fade-out.
#[derive(Debug)]
pub(crate) enum Mutation {
    Navigate {
        template: NodeId,
        bookmark: Option<String>,
    },
    Replace {
        targets: Vec<NodeId>,
        template: NodeId,
    },
    Refresh {
        targets: Vec<NodeId>,
    },
    Remove {
        targets: Vec<NodeId>,
    },
    Deactivate {
        targets: Vec<NodeId>,
    },
    Restore(Box<SaveData>),
}

#[derive(Debug)]
enum Continuation {
    Shown,
    Apply { nodes: Vec<NodeId>, mutation: Mutation },
    ReleaseHeight,
    Scrolled,
    Debut,
    ContainerShown,
}

/// What the session must do after a transition completes.
#[derive(Debug)]
pub(crate) enum Completion {
    Ignored,
    Done,
    Apply(Mutation),
    Debut,
}

/// Lock counter, pending transitions and the scene container's own state.
#[derive(Debug)]
pub struct SceneController {
    lock_count: u32,
    paused: bool,
    newly_added: Vec<NodeId>,
    height_override: Option<f64>,
    opacity: f64,
    outbox: VecDeque<Transition>,
    pending: BTreeMap<Ticket, Continuation>,
    next_ticket: u64,
    active_resize: Option<Ticket>,
    active_scroll: Option<Ticket>,
}

impl Default for SceneController {
    fn default() -> Self {
        Self {
            lock_count: 0,
            paused: false,
            newly_added: Vec::new(),
            height_override: None,
            opacity: 1.0,
            outbox: VecDeque::new(),
            pending: BTreeMap::new(),
            next_ticket: 0,
            active_resize: None,
            active_scroll: None,
        }
    }
}

impl SceneController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lock_count(&self) -> u32 {
        self.lock_count
    }

    /// Whether clicks are currently ignored.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Height the scene is pinned to, if any.
    #[must_use]
    pub fn height_override(&self) -> Option<f64> {
        self.height_override
    }

    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Takes every transition emitted since the last call.
    pub fn drain(&mut self) -> Vec<Transition> {
        self.outbox.drain(..).collect()
    }

    /// Increments the lock. The first lock pins the height at `current_height`
    /// and pauses input.
    pub fn lock(&mut self, current_height: f64) {
        self.lock_count += 1;
        if self.lock_count > 1 {
            return;
        }
        self.height_override = Some(current_height);
        self.paused = true;
        self.newly_added.clear();
    }

    /// Decrements the lock. Returns `true` when this was the outermost unlock,
    /// in which case new content is revealed, one resize is emitted and the new
    /// content fades in.
    pub fn unlock(
        &mut self,
        doc: &mut Document,
        stage: &dyn Stage,
        scene: NodeId,
        settings: &Settings,
    ) -> bool {
        self.lock_count = self.lock_count.saturating_sub(1);
        if self.lock_count > 0 {
            return false;
        }
        self.paused = false;

        let fresh: Vec<NodeId> = std::mem::take(&mut self.newly_added)
            .into_iter()
            .filter(|node| doc.contains(*node))
            .collect();
        for node in &fresh {
            doc.set_hidden(*node, false);
        }

        let to = stage.natural_height(doc, scene);
        let from = self.height_override.unwrap_or(to);
        if let Some(previous) = self.active_resize.take() {
            self.cancel(previous);
        }
        let ticket = self.emit(
            TransitionKind::Resize { from, to },
            settings.resize(),
            Continuation::ReleaseHeight,
        );
        self.active_resize = Some(ticket);
        self.height_override = Some(to);

        if !fresh.is_empty() {
            self.emit(
                TransitionKind::FadeIn { nodes: fresh },
                settings.fade(),
                Continuation::Shown,
            );
        }
        true
    }

    /// Records a node inserted while locked.
    pub fn register_new(&mut self, node: NodeId) {
        if !self.newly_added.contains(&node) {
            self.newly_added.push(node);
        }
    }

    /// Fades `nodes` out and parks `mutation` until that finishes. When none
    /// of them is visible the mutation is handed straight back.
    pub(crate) fn fade_out(
        &mut self,
        doc: &Document,
        nodes: Vec<NodeId>,
        mutation: Mutation,
        duration: Duration,
    ) -> Option<Mutation> {
        let visible: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|node| doc.is_visible(*node))
            .collect();
        if visible.is_empty() {
            return Some(mutation);
        }
        self.emit(
            TransitionKind::FadeOut { nodes: visible },
            duration,
            Continuation::Apply { nodes, mutation },
        );
        None
    }

    /// Scrolls to an offset, replacing any scroll still running.
    pub fn scroll_to_position(&mut self, to: f64, duration: Duration) {
        if let Some(previous) = self.active_scroll.take() {
            self.cancel(previous);
        }
        let ticket = self.emit(TransitionKind::Scroll { to }, duration, Continuation::Scrolled);
        self.active_scroll = Some(ticket);
    }

    /// Starts the first appearance of the story: the container is nearly
    /// transparent while `nodes` fade in once.
    pub fn debut(&mut self, nodes: Vec<NodeId>, opacity: f64, duration: Duration) {
        self.opacity = opacity;
        self.emit(TransitionKind::FadeIn { nodes }, duration, Continuation::Debut);
    }

    /// Brings the container to full opacity after the debut fade.
    pub fn show_container(&mut self, duration: Duration) {
        self.opacity = 1.0;
        self.emit(
            TransitionKind::ContainerFade { opacity: 1.0 },
            duration,
            Continuation::ContainerShown,
        );
    }

    /// Oldest transition still waiting for completion.
    #[must_use]
    pub fn next_pending(&self) -> Option<Ticket> {
        self.pending.keys().next().copied()
    }

    /// Resolves a finished transition. Unknown and superseded tickets are
    /// ignored.
    pub(crate) fn complete(&mut self, ticket: Ticket, doc: &mut Document) -> Completion {
        self.outbox.retain(|transition| transition.ticket != ticket);
        let Some(continuation) = self.pending.remove(&ticket) else {
            return Completion::Ignored;
        };
        match continuation {
            Continuation::Shown | Continuation::ContainerShown => Completion::Done,
            Continuation::ReleaseHeight => {
                if self.active_resize == Some(ticket) {
                    self.active_resize = None;
                    self.height_override = None;
                }
                Completion::Done
            }
            Continuation::Scrolled => {
                if self.active_scroll == Some(ticket) {
                    self.active_scroll = None;
                }
                Completion::Done
            }
            Continuation::Apply { nodes, mutation } => {
                for node in nodes {
                    doc.set_hidden(node, true);
                }
                Completion::Apply(mutation)
            }
            Continuation::Debut => Completion::Debut,
        }
    }

    fn emit(
        &mut self,
        kind: TransitionKind,
        duration: Duration,
        continuation: Continuation,
    ) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.outbox.push_back(Transition {
            ticket,
            kind,
            duration,
        });
        self.pending.insert(ticket, continuation);
        ticket
    }

    fn cancel(&mut self, ticket: Ticket) {
        self.outbox.retain(|transition| transition.ticket != ticket);
        self.pending.remove(&ticket);
    }
}

const SETTLE_LIMIT: usize = 10_000;

impl StorySession {
    /// Transitions emitted since the last call, for the host to animate.
    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        self.controller.drain()
    }

    /// Reports that the host finished animating `ticket` and resumes whatever
    /// was waiting on it. Returns `false` for unknown or superseded tickets.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        match self.controller.complete(ticket, &mut self.doc) {
            Completion::Ignored => false,
            Completion::Done => true,
            Completion::Apply(mutation) => {
                self.apply(mutation);
                true
            }
            Completion::Debut => {
                self.controller.show_container(self.settings.debut_fade());
                self.unlock();
                true
            }
        }
    }

    /// Completes every pending transition, oldest first, until nothing is
    /// left.
    pub fn settle(&mut self) {
        for _ in 0..SETTLE_LIMIT {
            let Some(ticket) = self.controller.next_pending() else {
                return;
            };
            self.finish(ticket);
        }
        warn!(limit = SETTLE_LIMIT, "scene did not settle");
    }

    pub(crate) fn lock(&mut self) {
        let current = self
            .controller
            .height_override()
            .unwrap_or_else(|| self.stage.natural_height(&self.doc, self.scene));
        self.controller.lock(current);
    }

    pub(crate) fn unlock(&mut self) {
        if self
            .controller
            .unlock(&mut self.doc, self.stage.as_ref(), self.scene, &self.settings)
        {
            debug!("scene settled");
        }
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.controller.scroll_to_position(0.0, self.settings.scroll());
    }

    /// Scrolls only when `target` is off-screen. The scene's first element
    /// scrolls to the top.
    pub(crate) fn scroll_to(&mut self, target: Option<NodeId>) {
        let Some(target) = target.filter(|node| self.doc.contains(*node)) else {
            self.scroll_to_top();
            return;
        };
        if self.stage.is_on_screen(&self.doc, target) {
            return;
        }
        if self.doc.element_children(self.scene).first() == Some(&target) {
            self.scroll_to_top();
            return;
        }
        let to = self.stage.offset_top(&self.doc, target);
        self.controller.scroll_to_position(to, self.settings.scroll());
    }

    /// Registers freshly inserted content, runs its load actions and
    /// formatting unless `run` is false, and hides it until the scene settles.
    pub(crate) fn post_new(&mut self, node: NodeId, run: bool) {
        if !self.doc.contains(node) {
            return;
        }
        self.controller.register_new(node);
        if run {
            self.run_load_pass(node, false);
            self.format(node);
        }
        self.doc.set_hidden(node, true);
    }

    pub(crate) fn format(&mut self, root: NodeId) {
        comma_series(&mut self.doc, root, self.settings.use_oxford_comma);
    }

    pub(crate) fn fade_out_then(&mut self, nodes: Vec<NodeId>, mutation: Mutation) {
        let immediate = self
            .controller
            .fade_out(&self.doc, nodes, mutation, self.settings.fade());
        if let Some(mutation) = immediate {
            self.apply(mutation);
        }
    }

    fn in_scene(&self, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        nodes.retain(|node| self.doc.is_ancestor_of(self.scene, *node));
        self.doc.sort_unique(&mut nodes);
        nodes
    }

    /// Replaces the scene with a clone of `template` and records a bookmark.
    pub(crate) fn go_to(&mut self, template: Option<NodeId>, selector: &str) {
        let Some(template) = template else {
            info!(%selector, "scene has not been written yet");
            self.stage.notify(Notice::NotWrittenYet);
            return;
        };
        info!(%selector, "going to scene");
        self.scroll_to_top();
        self.lock();
        let children = self.doc.element_children(self.scene);
        self.fade_out_then(
            children,
            Mutation::Navigate {
                template,
                bookmark: Some(selector.to_owned()),
            },
        );
    }

    /// Like [`go_to`](Self::go_to) without recording a bookmark.
    pub(crate) fn go_back_to(&mut self, template: NodeId) {
        info!("going back");
        self.scroll_to_top();
        self.lock();
        let children = self.doc.element_children(self.scene);
        self.fade_out_then(
            children,
            Mutation::Navigate {
                template,
                bookmark: None,
            },
        );
    }

    pub(crate) fn prepend_to_scene(&mut self, template: Option<NodeId>) {
        let Some(clone) = Canon::clone_template(&mut self.doc, template) else {
            return;
        };
        self.scroll_to_top();
        self.lock();
        self.doc.prepend_child(self.scene, clone);
        self.post_new(clone, true);
        self.unlock();
    }

    pub(crate) fn append_to_scene(&mut self, template: Option<NodeId>) {
        let Some(clone) = Canon::clone_template(&mut self.doc, template) else {
            return;
        };
        self.lock();
        self.doc.append_child(self.scene, clone);
        self.scroll_to(Some(clone));
        self.post_new(clone, true);
        self.unlock();
    }

    /// Inserts one clone of `template` at each target, inside or beside it.
    pub(crate) fn insert_around(
        &mut self,
        placement: Placement,
        template: Option<NodeId>,
        targets: Vec<NodeId>,
        outside: bool,
    ) {
        let Some(template) = template else {
            return;
        };
        let targets = self.in_scene(targets);
        if targets.is_empty() {
            return;
        }
        self.lock();
        let mut first = None;
        for target in targets {
            if !self.doc.contains(target) {
                continue;
            }
            let Some(clone) = Canon::clone_template(&mut self.doc, Some(template)) else {
                continue;
            };
            first.get_or_insert(clone);
            match (placement, outside) {
                (Placement::Prepend, true) => self.doc.insert_before(target, clone),
                (Placement::Prepend, false) => self.doc.prepend_child(target, clone),
                (Placement::Append, true) => self.doc.insert_after(target, clone),
                (Placement::Append, false) => self.doc.append_child(target, clone),
            }
            self.post_new(clone, true);
        }
        self.scroll_to(first);
        self.unlock();
    }

    /// Swaps each target for a clone of `template`; no template removes them.
    pub(crate) fn replace(&mut self, targets: Vec<NodeId>, template: Option<NodeId>) {
        let targets = self.in_scene(targets);
        if targets.is_empty() {
            return;
        }
        let Some(template) = template else {
            self.remove(targets);
            return;
        };
        self.scroll_to(targets.first().copied());
        self.lock();
        self.fade_out_then(targets.clone(), Mutation::Replace { targets, template });
    }

    /// Re-runs the load actions of each target.
    pub(crate) fn refresh(&mut self, targets: Vec<NodeId>) {
        let targets = self.in_scene(targets);
        if targets.is_empty() {
            return;
        }
        self.scroll_to(targets.first().copied());
        self.lock();
        self.fade_out_then(targets.clone(), Mutation::Refresh { targets });
    }

    pub(crate) fn refresh_all(&mut self) {
        let children = self.doc.element_children(self.scene);
        self.refresh(children);
    }

    pub(crate) fn remove(&mut self, targets: Vec<NodeId>) {
        let targets = self.in_scene(targets);
        if targets.is_empty() {
            return;
        }
        self.scroll_to(targets.first().copied());
        self.lock();
        self.fade_out_then(targets.clone(), Mutation::Remove { targets });
    }

    /// Turns the clickable elements in or under each target into plain spans.
    pub(crate) fn deactivate(&mut self, targets: Vec<NodeId>) {
        let targets = self.in_scene(targets);
        let mut links: Vec<NodeId> = targets
            .into_iter()
            .flat_map(|target| self.doc.subtree_elements(target))
            .filter(|node| is_interactive(&self.doc, *node))
            .collect();
        self.doc.sort_unique(&mut links);
        if links.is_empty() {
            return;
        }
        self.scroll_to(links.first().copied());
        self.lock();
        self.fade_out_then(links.clone(), Mutation::Deactivate { targets: links });
    }

    /// First appearance of the story.
    pub(crate) fn debut(&mut self, template: NodeId, selector: &str) {
        info!(%selector, "story debut");
        self.scroll_to_top();
        self.lock();
        let opted_out = Bookmarks::opts_out(&self.doc, template);
        self.bookmarks.push(template, selector, opted_out);
        let Some(clone) = Canon::clone_template(&mut self.doc, Some(template)) else {
            self.unlock();
            return;
        };
        self.doc.clear_children(self.scene);
        self.doc.append_child(self.scene, clone);
        self.post_new(clone, true);
        self.doc.set_hidden(clone, false);
        self.controller.debut(
            vec![clone],
            self.settings.debut_opacity,
            self.settings.debut_fade(),
        );
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Navigate { template, bookmark } => {
                self.doc.clear_children(self.scene);
                if let Some(clone) = Canon::clone_template(&mut self.doc, Some(template)) {
                    self.doc.append_child(self.scene, clone);
                    if let Some(selector) = bookmark {
                        let opted_out = Bookmarks::opts_out(&self.doc, template);
                        self.bookmarks.push(template, &selector, opted_out);
                    }
                    self.post_new(clone, true);
                }
            }
            Mutation::Replace { targets, template } => {
                for target in targets {
                    if !self.doc.contains(target) {
                        continue;
                    }
                    if let Some(clone) = Canon::clone_template(&mut self.doc, Some(template)) {
                        self.doc.replace_with(target, clone);
                        self.post_new(clone, true);
                    }
                }
            }
            Mutation::Refresh { targets } => {
                for target in targets {
                    self.doc.set_hidden(target, false);
                    self.post_new(target, true);
                }
            }
            Mutation::Remove { targets } => {
                for target in targets {
                    self.doc.destroy(target);
                }
            }
            Mutation::Deactivate { targets } => {
                for target in targets {
                    self.deactivate_one(target);
                }
            }
            Mutation::Restore(data) => {
                self.restore(*data);
            }
        }
        self.unlock();
    }

    fn deactivate_one(&mut self, link: NodeId) {
        if !self.doc.contains(link) {
            return;
        }
        let span = self.doc.create_element("span");
        for child in self.doc.children(link).to_vec() {
            self.doc.append_child(span, child);
        }
        if let Some(class) = self.doc.attribute(link, "class").map(str::to_owned) {
            self.doc.set_attribute(span, "class", &class);
            self.doc.remove_class(span, CLICK_ACTION_CLASS);
        }
        self.doc.replace_with(link, span);
        self.post_new(span, true);
    }
}

#[cfg(test)]
mod tests {
    use gamebook_test_support::ScriptedStage;

    use super::*;

    fn scene_fixture() -> (Document, NodeId) {
        let mut doc = Document::new();
        let scene = doc.create_element("div");
        doc.append_child(doc.root(), scene);
        (doc, scene)
    }

    fn resizes(transitions: &[Transition]) -> usize {
        transitions
            .iter()
            .filter(|t| matches!(t.kind, TransitionKind::Resize { .. }))
            .count()
    }

    #[test]
    fn test_nested_locks_settle_once() {
        // Arrange
        let (mut doc, scene) = scene_fixture();
        let stage = ScriptedStage::new();
        let settings = Settings::default();
        let mut controller = SceneController::new();

        // Act
        controller.lock(0.0);
        controller.lock(0.0);
        let inner = controller.unlock(&mut doc, &stage, scene, &settings);
        let paused_between = controller.is_paused();
        let outer = controller.unlock(&mut doc, &stage, scene, &settings);

        // Assert
        assert!(!inner);
        assert!(paused_between);
        assert!(outer);
        assert!(!controller.is_paused());
        assert_eq!(resizes(&controller.drain()), 1);
    }

    #[test]
    fn test_new_resize_supersedes_the_old_one() {
        let (mut doc, scene) = scene_fixture();
        let stage = ScriptedStage::new();
        let settings = Settings::default();
        let mut controller = SceneController::new();

        controller.lock(0.0);
        controller.unlock(&mut doc, &stage, scene, &settings);
        let first = controller.drain();
        controller.lock(0.0);
        controller.unlock(&mut doc, &stage, scene, &settings);

        let stale = first[0].ticket;
        assert!(matches!(
            controller.complete(stale, &mut doc),
            Completion::Ignored
        ));
        assert_eq!(resizes(&controller.drain()), 1);
    }

    #[test]
    fn test_unlock_reveals_new_nodes_and_fades_them_in() {
        let (mut doc, scene) = scene_fixture();
        let node = doc.create_element("p");
        doc.append_child(scene, node);
        let stage = ScriptedStage::new();
        let settings = Settings::default();
        let mut controller = SceneController::new();

        controller.lock(0.0);
        controller.register_new(node);
        doc.set_hidden(node, true);
        controller.unlock(&mut doc, &stage, scene, &settings);

        assert!(!doc.is_hidden(node));
        assert!(controller.drain().iter().any(|t| t.kind
            == TransitionKind::FadeIn {
                nodes: vec![node]
            }));
    }

    #[test]
    fn test_fade_out_of_invisible_nodes_is_immediate() {
        let (mut doc, scene) = scene_fixture();
        let node = doc.create_element("p");
        doc.append_child(scene, node);
        doc.set_hidden(node, true);
        let mut controller = SceneController::new();

        let handed_back = controller.fade_out(
            &doc,
            vec![node],
            Mutation::Remove {
                targets: vec![node],
            },
            Duration::from_millis(300),
        );

        assert!(handed_back.is_some());
        assert!(!controller.has_pending());
    }

    #[test]
    fn test_resize_completion_releases_height() {
        let (mut doc, scene) = scene_fixture();
        let stage = ScriptedStage::new();
        let settings = Settings::default();
        let mut controller = SceneController::new();

        controller.lock(40.0);
        assert_eq!(controller.height_override(), Some(40.0));
        controller.unlock(&mut doc, &stage, scene, &settings);
        let ticket = controller.drain()[0].ticket;
        controller.complete(ticket, &mut doc);

        assert_eq!(controller.height_override(), None);
    }
}
