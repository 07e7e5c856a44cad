//! Gamebook Document — the tree the engine reads templates from and renders
//! scenes into.
//!
//! Provides an arena-backed element tree with generational handles, a small
//! CSS-subset selector engine, serde fragments for authoring and saving, and
//! the comma-series formatting pass. It is not a markup parser.

pub mod document;
pub mod format;
pub mod fragment;
pub mod selector;

pub use document::{Document, NodeId, NodeKind};
pub use fragment::{ElementFragment, Fragment};
pub use selector::{Selector, SelectorError};
