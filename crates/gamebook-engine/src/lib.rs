//! Gamebook Engine — turns a canon of templates into a navigable story.
//!
//! The domain layer holds the pure pieces: the flexible selector resolver,
//! the canon lookup, logic chains, bookmark history and the action tables.
//! The application layer holds [`StorySession`](application::session::StorySession),
//! which owns the document and drives scene transitions.

pub mod application;
pub mod domain;

pub use application::session::{Collaborators, StorySession};
pub use application::transition::{Ticket, Transition, TransitionKind};
