//! Shape model of the map drawing library.
//!
//! Vertices are `(lat, lng)` and rings are open: the library never repeats
//! the first vertex at the end of a ring.

use serde::{Deserialize, Serialize};

use super::LayerStyle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// GeoJSON position (`[lng, lat]`)
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }

    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }
}

/// A layer as produced by the drawing tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeShape {
    /// Outer ring followed by holes
    Polygon { rings: Vec<Vec<LatLng>> },
    MultiPolygon { polygons: Vec<Vec<Vec<LatLng>>> },
    Rectangle { south_west: LatLng, north_east: LatLng },
    Polyline { points: Vec<LatLng> },
    Marker { position: LatLng },
    Circle { center: LatLng, radius_m: f64 },
}

/// A shape ready to hand to the renderer, with its styling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawable {
    pub shape: NativeShape,
    pub style: LayerStyle,
}
