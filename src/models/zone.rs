//! Zone and classification records as served by the zoning backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConstraintError;
use crate::geometry;

/// Backend identifier of a zone or boundary record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub i64);

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend identifier of a zoning classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationId(pub i64);

impl std::fmt::Display for ClassificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a zone record represents on the map.
///
/// The backend leaves `boundary_type` null for ordinary land-use zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundaryType {
    /// Land-use zone carrying a zoning classification
    #[default]
    Zoning,
    /// The municipality outline (at most one per installation)
    Municipal,
    /// A barangay outline, used to scope zoning zones
    Barangay,
}

impl BoundaryType {
    /// Wire value, `None` for zoning zones
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            BoundaryType::Zoning => None,
            BoundaryType::Municipal => Some("municipal"),
            BoundaryType::Barangay => Some("barangay"),
        }
    }

    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("municipal") => BoundaryType::Municipal,
            Some("barangay") => BoundaryType::Barangay,
            _ => BoundaryType::Zoning,
        }
    }

    pub fn is_boundary(&self) -> bool {
        !matches!(self, BoundaryType::Zoning)
    }
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire().unwrap_or("zoning"))
    }
}

impl Serialize for BoundaryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_wire() {
            Some(v) => serializer.serialize_str(v),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for BoundaryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(BoundaryType::from_wire(raw.as_deref()))
    }
}

/// A polygonal zoning unit or administrative boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,

    /// Classification this zone was created with (boundaries have none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification_id: Option<ClassificationId>,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Fill colour as `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub boundary_type: BoundaryType,

    /// GeoJSON Polygon or MultiPolygon, null once the drawn shape is deleted
    #[serde(default)]
    pub geometry: Option<geojson::Geometry>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub has_geometry: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Zone {
    pub fn is_zoning(&self) -> bool {
        self.boundary_type == BoundaryType::Zoning
    }

    /// Label if present, else the classification name, else the code
    pub fn display_name(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .or_else(|| Some(self.name.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or(&self.code)
    }

    /// Geometry as a `geo` multipolygon, `None` when the zone has no shape
    pub fn geo(&self) -> Option<Result<geo::MultiPolygon<f64>, ConstraintError>> {
        self.geometry.as_ref().map(geometry::to_geo)
    }
}

/// Reference entity assigned to a zone at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoningClassification {
    pub id: ClassificationId,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boundary_type_from_null() {
        let zone: Zone = serde_json::from_value(json!({
            "id": 4,
            "code": "R1",
            "name": "Low Density Residential",
            "boundary_type": null,
            "geometry": null,
            "is_active": true,
            "has_geometry": false
        }))
        .unwrap();

        assert_eq!(zone.boundary_type, BoundaryType::Zoning);
        assert!(zone.geometry.is_none());
        assert!(zone.is_zoning());
    }

    #[test]
    fn test_boundary_type_round_trip() {
        let zone: Zone = serde_json::from_value(json!({
            "id": 9,
            "label": "Poblacion",
            "boundary_type": "barangay"
        }))
        .unwrap();
        assert_eq!(zone.boundary_type, BoundaryType::Barangay);

        let value = serde_json::to_value(&zone).unwrap();
        assert_eq!(value["boundary_type"], "barangay");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut zone: Zone = serde_json::from_value(json!({
            "id": 1,
            "code": "C1",
            "name": "Commercial"
        }))
        .unwrap();
        assert_eq!(zone.display_name(), "Commercial");

        zone.label = Some("Market Block".to_string());
        assert_eq!(zone.display_name(), "Market Block");

        zone.label = None;
        zone.name.clear();
        assert_eq!(zone.display_name(), "C1");
    }
}
