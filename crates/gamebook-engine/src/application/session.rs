//! The story session: one running story and everything it owns.

use gamebook_core::evaluator::Evaluator;
use gamebook_core::rng::DeterministicRng;
use gamebook_core::settings::Settings;
use gamebook_core::stage::{Notice, Prompt, Stage};
use gamebook_core::store::SaveStore;
use gamebook_core::{StoryError, Variables};
use gamebook_document::{Document, NodeId};
use tracing::{debug, info, instrument};

use super::transition::SceneController;
use crate::domain::actions::is_interactive;
use crate::domain::bookmarks::{Bookmarks, Retreat};
use crate::domain::canon::{Canon, locate_scene};
use crate::domain::selector::SelectorResolver;

const START_SELECTORS: [&str; 2] = [".start", ":first"];

/// The ports a session talks through.
pub struct Collaborators {
    pub stage: Box<dyn Stage>,
    pub store: Box<dyn SaveStore>,
    pub evaluator: Box<dyn Evaluator>,
    pub rng: Box<dyn DeterministicRng>,
}

/// A running story.
///
/// Owns the document, the variables, the bookmark history and the scene
/// controller. Every entry point runs synchronously; timed changes are left
/// in the transition outbox for the host.
pub struct StorySession {
    pub(super) doc: Document,
    pub(super) canon: Canon,
    pub(super) scene: NodeId,
    pub(super) variables: Variables,
    pub(super) bookmarks: Bookmarks,
    pub(super) settings: Settings,
    pub(super) controller: SceneController,
    pub(super) stage: Box<dyn Stage>,
    pub(super) store: Box<dyn SaveStore>,
    pub(super) evaluator: Box<dyn Evaluator>,
    pub(super) rng: Box<dyn DeterministicRng>,
}

impl StorySession {
    /// Locates the canon and scene containers and debuts the start of the
    /// story: the first `.start` template, else the first template.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::MissingCanon` or `StoryError::MissingScene` when
    /// a container is absent, and `StoryError::EmptyStory` when the canon has
    /// nothing to start from.
    #[instrument(skip_all, fields(story_id = %settings.story_id))]
    pub fn start(
        doc: Document,
        settings: Settings,
        collaborators: Collaborators,
    ) -> Result<Self, StoryError> {
        let canon = Canon::locate(&doc)?;
        let scene = locate_scene(&doc)?;
        let Collaborators {
            stage,
            store,
            evaluator,
            rng,
        } = collaborators;
        let mut session = Self {
            doc,
            canon,
            scene,
            variables: Variables::new(),
            bookmarks: Bookmarks::new(),
            settings,
            controller: SceneController::new(),
            stage,
            store,
            evaluator,
            rng,
        };

        let Some((template, selector)) = session.find_start() else {
            session.stage.notify(Notice::StoryEmpty);
            return Err(StoryError::EmptyStory);
        };
        session.debut(template, selector);
        info!("story started");
        Ok(session)
    }

    /// Handles a click on `node`. Only visible links and click-action elements
    /// in the scene react, and nothing but `#top` scrolling happens while the
    /// scene is changing. Returns whether click actions ran.
    #[instrument(skip(self))]
    pub fn click(&mut self, node: NodeId) -> bool {
        if !self.doc.is_ancestor_of(self.scene, node)
            || !is_interactive(&self.doc, node)
            || !self.doc.is_visible(node)
        {
            debug!("not a live link");
            return false;
        }
        if self.doc.attribute(node, "href") == Some("#top") {
            self.scroll_to_top();
        }
        if self.controller.is_paused() {
            debug!("ignoring click while the scene is changing");
            return false;
        }
        self.run_click_actions(node);
        true
    }

    /// Restarts the story, at `alternate` if it names a template. Asks the
    /// reader first unless `quiet`.
    #[instrument(skip(self))]
    pub fn reset(&mut self, alternate: Option<&str>, quiet: bool) {
        if !quiet && !self.stage.confirm(Prompt::RestartStory) {
            return;
        }
        info!("resetting story");
        self.variables.clear();
        self.bookmarks.reset(false);
        let alternate = alternate
            .and_then(|selector| self.find_template(selector).map(|t| (t, selector.to_owned())));
        match alternate {
            Some((template, selector)) => self.go_to(Some(template), &selector),
            None => match self.find_start() {
                Some((template, selector)) => self.go_to(Some(template), selector),
                None => self.stage.notify(Notice::StoryEmpty),
            },
        }
    }

    /// Returns to the previous bookmark, or to `fallback` when history has
    /// nowhere to go.
    #[instrument(skip(self))]
    pub fn back(&mut self, fallback: Option<&str>) {
        let fallback = fallback
            .and_then(|selector| self.find_template(selector).map(|t| (t, selector.to_owned())));
        match (self.bookmarks.back(), fallback) {
            (Retreat::To(template), _) => self.go_back_to(template),
            (Retreat::AtStart, Some((template, selector))) => {
                self.go_to(Some(template), &selector);
            }
            (Retreat::Emptied, Some((template, _))) => self.go_back_to(template),
            (Retreat::AtStart | Retreat::Emptied, None) => {
                self.stage.notify(Notice::CannotGoBack);
            }
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The scene container.
    #[must_use]
    pub fn scene(&self) -> NodeId {
        self.scene
    }

    #[must_use]
    pub fn canon(&self) -> Canon {
        self.canon
    }

    #[must_use]
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    #[must_use]
    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn controller(&self) -> &SceneController {
        &self.controller
    }

    /// Whether a scene change is in progress.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.controller.lock_count() > 0
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    /// Visible clickable elements in the scene, in document order.
    #[must_use]
    pub fn interactive_elements(&self) -> Vec<NodeId> {
        self.doc
            .descendant_elements(self.scene)
            .into_iter()
            .filter(|node| is_interactive(&self.doc, *node) && self.doc.is_visible(*node))
            .collect()
    }

    /// Asks the reader a question through the stage.
    pub fn confirm(&mut self, prompt: Prompt) -> bool {
        self.stage.confirm(prompt)
    }

    pub(crate) fn resolver(&self) -> SelectorResolver<'_> {
        SelectorResolver::new(&self.doc, &self.variables, self.scene)
    }

    /// First canon template matching `selector`.
    pub(crate) fn find_template(&self, selector: &str) -> Option<NodeId> {
        self.canon.find(&self.resolver(), selector)
    }

    /// Scene elements matching `selector`, ascending from `anchor` for `^`.
    pub(crate) fn find_in_scene(&self, selector: &str, anchor: Option<NodeId>) -> Vec<NodeId> {
        self.resolver().find(self.scene, selector, anchor)
    }

    fn find_start(&self) -> Option<(NodeId, &'static str)> {
        START_SELECTORS.into_iter().find_map(|selector| {
            self.find_template(selector)
                .map(|template| (template, selector))
        })
    }
}
