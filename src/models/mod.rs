//! Core data models for the zoning map editor.

pub mod zone;
pub mod zone_set;

pub use zone::{BoundaryType, ClassificationId, Zone, ZoneId, ZoningClassification};
pub use zone_set::ZoneSet;
