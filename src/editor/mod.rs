//! Edit-mode state machine.
//!
//! All operator input goes through [`reduce`]; [`MapEditor`] runs the
//! resulting effects against the map and the backend.

mod action;
mod controller;
mod reducer;
mod state;

pub use action::{Action, Effect, Notice, NoticeLevel};
pub use controller::MapEditor;
pub use reducer::{reduce, ReduceContext, Transition};
pub use state::{EditMode, EditorState, Phase, SaveOrigin, SaveRequest};
