//! Request bodies sent to the backend.

use std::fmt;
use std::str::FromStr;

use geojson::Geometry;
use serde::{Deserialize, Serialize};

use crate::models::ClassificationId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewZone {
    pub classification_id: ClassificationId,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub is_active: bool,
}

/// Body for a new municipal or barangay outline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBoundary {
    pub geometry: Geometry,
    pub label: String,
}

/// Partial update; absent fields are left untouched by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZonePatch {
    /// `Some(None)` is sent as `null` and clears the shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Option<Geometry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ZonePatch {
    pub fn geometry(geometry: Option<Geometry>) -> Self {
        Self {
            geometry: Some(geometry),
            ..Self::default()
        }
    }
}

/// Which layer family an uploaded GeoJSON file replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportTarget {
    Municipal,
    Zones,
}

impl ImportTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportTarget::Municipal => "municipal",
            ImportTarget::Zones => "zones",
        }
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "municipal" => Ok(ImportTarget::Municipal),
            "zones" => Ok(ImportTarget::Zones),
            other => Err(format!(
                "unknown import target '{}', expected 'municipal' or 'zones'",
                other
            )),
        }
    }
}
