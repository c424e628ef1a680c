//! Geometry adapter between the drawing tool and GeoJSON.
//!
//! GeoJSON Polygon/MultiPolygon with closed rings is the interchange format
//! at every boundary of the editor core.

mod adapter;
mod native;
mod style;

pub use adapter::{close_rings, from_geo, from_geojson, to_geo, to_geojson};
pub use native::{Drawable, LatLng, NativeShape};
pub use style::{LayerStyle, StylePalette, DEFAULT_ZONE_FILL};
