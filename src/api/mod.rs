//! Client for the zoning-map backend.
//!
//! The editor only needs the [`ZoneApi`] trait; [`HttpZoneApi`] talks to the
//! real JSON endpoints.

mod client;
mod payload;

pub use client::HttpZoneApi;
pub use payload::{ImportTarget, NewBoundary, NewZone, ZonePatch};

use crate::error::ApiError;
use crate::models::{Zone, ZoneId, ZoningClassification};

/// Remote operations on zones, boundaries and classifications
#[allow(async_fn_in_trait)]
pub trait ZoneApi {
    async fn list_zones(&self) -> Result<Vec<Zone>, ApiError>;

    async fn get_zone(&self, id: ZoneId) -> Result<Zone, ApiError>;

    async fn list_classifications(
        &self,
        active_only: bool,
    ) -> Result<Vec<ZoningClassification>, ApiError>;

    /// `None` when no municipal outline has been drawn yet
    async fn municipal_boundary(&self) -> Result<Option<Zone>, ApiError>;

    async fn barangay_boundaries(&self) -> Result<Vec<Zone>, ApiError>;

    async fn create_zone(&self, zone: &NewZone) -> Result<(), ApiError>;

    async fn create_municipal(&self, boundary: &NewBoundary) -> Result<(), ApiError>;

    async fn create_barangay(&self, boundary: &NewBoundary) -> Result<(), ApiError>;

    async fn update_zone(&self, id: ZoneId, patch: &ZonePatch) -> Result<(), ApiError>;

    async fn update_barangay(&self, id: ZoneId, patch: &ZonePatch) -> Result<(), ApiError>;

    async fn delete_zone(&self, id: ZoneId) -> Result<(), ApiError>;

    /// Whole working set as a GeoJSON FeatureCollection
    async fn export_geojson(&self) -> Result<Vec<u8>, ApiError>;

    async fn import_geojson(
        &self,
        target: ImportTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError>;
}
