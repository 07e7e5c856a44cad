pub mod actions;
pub mod bookmarks;
pub mod canon;
pub mod logic;
pub mod selector;
