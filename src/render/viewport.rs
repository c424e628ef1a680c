//! Map viewport state.

use geo::{Coord, Rect};

/// Visible map extent in lon/lat plus the zoom level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: Rect<f64>,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64, zoom: f64) -> Self {
        Self {
            bounds: Rect::new(
                Coord {
                    x: min_lon,
                    y: min_lat,
                },
                Coord {
                    x: max_lon,
                    y: max_lat,
                },
            ),
            zoom,
        }
    }

    /// Parse bbox string "minLon,minLat,maxLon,maxLat"
    pub fn parse_bbox(bbox: &str, zoom: f64) -> Option<Self> {
        let parts: Vec<f64> = bbox
            .split(',')
            .filter_map(|p| p.trim().parse().ok())
            .collect();
        if parts.len() == 4 {
            Some(Self::new(parts[0], parts[1], parts[2], parts[3], zoom))
        } else {
            None
        }
    }
}
