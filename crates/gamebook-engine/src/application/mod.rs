pub mod interpreter;
pub mod persistence;
pub mod session;
pub mod transition;
