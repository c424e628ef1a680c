//! Spatial constraint engine.
//!
//! Keeps zoning zones inside their barangay and free of overlaps with
//! neighbouring zones.

mod audit;
mod engine;

pub use audit::{audit, AuditReport, Overlap};
pub use engine::{ConstraintEngine, ConstraintReport, Constrained, TrimStrategy};
