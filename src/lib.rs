//! Zonemap - editor core for municipal zoning maps
//!
//! This library holds the geometry adapter, spatial constraint engine,
//! viewport render manager and edit-mode state machine shared by the CLI
//! and the constraint server.

pub mod api;
pub mod config;
pub mod constraint;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod index;
pub mod models;
pub mod render;

pub use constraint::{ConstraintEngine, TrimStrategy};
pub use editor::{Action, EditMode, EditorState, MapEditor};
pub use error::{ApiError, ConstraintError, EditorError};
pub use models::{BoundaryType, Zone, ZoneId, ZoneSet};
