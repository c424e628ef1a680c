//! Conversions between drawing-tool shapes, GeoJSON and `geo` polygons.

use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use geojson::{Geometry, Value};

use super::{Drawable, LatLng, LayerStyle, NativeShape};
use crate::error::ConstraintError;

type Ring = Vec<Vec<f64>>;

/// Convert a drawn layer to a GeoJSON Polygon or MultiPolygon.
///
/// Returns `None` when the layer encodes no valid ring (markers, lines,
/// circles, or polygons collapsed to fewer than three distinct vertices).
pub fn to_geojson(shape: &NativeShape) -> Option<Geometry> {
    match shape {
        NativeShape::Polygon { rings } => {
            polygon_rings(rings).map(|rings| Geometry::new(Value::Polygon(rings)))
        }
        NativeShape::MultiPolygon { polygons } => {
            let polygons: Vec<Vec<Ring>> = polygons
                .iter()
                .filter_map(|rings| polygon_rings(rings))
                .collect();
            if polygons.is_empty() {
                None
            } else {
                Some(Geometry::new(Value::MultiPolygon(polygons)))
            }
        }
        NativeShape::Rectangle {
            south_west,
            north_east,
        } => {
            let corners = vec![
                *south_west,
                LatLng::new(south_west.lat, north_east.lng),
                *north_east,
                LatLng::new(north_east.lat, south_west.lng),
            ];
            let ring = open_ring(&corners)?;
            Some(Geometry::new(Value::Polygon(vec![ring])))
        }
        NativeShape::Polyline { .. } | NativeShape::Marker { .. } | NativeShape::Circle { .. } => {
            None
        }
    }
}

/// Outer ring plus valid holes; `None` when the outer ring is degenerate
fn polygon_rings(rings: &[Vec<LatLng>]) -> Option<Vec<Ring>> {
    let (outer, holes) = rings.split_first()?;
    let mut out = vec![open_ring(outer)?];
    out.extend(holes.iter().filter_map(|h| open_ring(h)));
    Some(out)
}

/// Closed GeoJSON ring from an open vertex list
fn open_ring(vertices: &[LatLng]) -> Option<Ring> {
    let mut ring: Vec<LatLng> = Vec::with_capacity(vertices.len() + 1);
    for v in vertices {
        if ring.last() != Some(v) {
            ring.push(*v);
        }
    }
    // The library sometimes hands back an already closed ring
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return None;
    }

    let coords: Vec<Coord<f64>> = ring.iter().map(|v| Coord { x: v.lng, y: v.lat }).collect();
    if Polygon::new(LineString::new(coords), vec![]).unsigned_area() == 0.0 {
        return None;
    }

    let mut positions: Ring = ring.into_iter().map(LatLng::to_position).collect();
    positions.push(positions[0].clone());
    Some(positions)
}

/// Append the first position to every ring that does not already end with it.
///
/// Idempotent; geometries other than Polygon/MultiPolygon pass through.
pub fn close_rings(mut geometry: Geometry) -> Geometry {
    match &mut geometry.value {
        Value::Polygon(rings) => close_polygon(rings),
        Value::MultiPolygon(polygons) => polygons.iter_mut().for_each(|p| close_polygon(p)),
        _ => {}
    }
    geometry
}

fn close_polygon(rings: &mut [Ring]) {
    for ring in rings.iter_mut() {
        // Close the ring if needed
        if !ring.is_empty() && ring.first() != ring.last() {
            ring.push(ring[0].clone());
        }
    }
}

/// Turn GeoJSON back into a drawable layer with the given style
pub fn from_geojson(geometry: &Geometry, style: &LayerStyle) -> Option<Drawable> {
    let shape = match &geometry.value {
        Value::Polygon(rings) => NativeShape::Polygon {
            rings: native_rings(rings)?,
        },
        Value::MultiPolygon(polygons) => NativeShape::MultiPolygon {
            polygons: polygons
                .iter()
                .map(|rings| native_rings(rings))
                .collect::<Option<Vec<_>>>()?,
        },
        _ => return None,
    };

    Some(Drawable {
        shape,
        style: style.clone(),
    })
}

fn native_rings(rings: &[Ring]) -> Option<Vec<Vec<LatLng>>> {
    rings
        .iter()
        .map(|ring| {
            let mut vertices: Vec<LatLng> = ring
                .iter()
                .map(|p| LatLng::from_position(p))
                .collect::<Option<_>>()?;
            if vertices.len() > 1 && vertices.first() == vertices.last() {
                vertices.pop();
            }
            Some(vertices)
        })
        .collect()
}

/// GeoJSON Polygon/MultiPolygon as a `geo` multipolygon
pub fn to_geo(geometry: &Geometry) -> Result<MultiPolygon<f64>, ConstraintError> {
    match &geometry.value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| polygon_from_rings(rings))
            .collect::<Result<Vec<_>, _>>()
            .map(MultiPolygon::new),
        other => Err(ConstraintError::InvalidGeometry(format!(
            "expected Polygon or MultiPolygon, got {}",
            value_type_name(other)
        ))),
    }
}

fn polygon_from_rings(rings: &[Ring]) -> Result<Polygon<f64>, ConstraintError> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| ConstraintError::InvalidGeometry("polygon has no rings".to_string()))?;

    let exterior = line_string(exterior)?;
    let interiors = interiors
        .iter()
        .map(|r| line_string(r))
        .collect::<Result<Vec<_>, _>>()?;

    // Polygon::new closes every ring
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(ring: &[Vec<f64>]) -> Result<LineString<f64>, ConstraintError> {
    let coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(ConstraintError::InvalidGeometry(
                "position has fewer than two coordinates".to_string(),
            )),
        })
        .collect::<Result<_, _>>()?;

    let distinct = if coords.len() > 1 && coords.first() == coords.last() {
        coords.len() - 1
    } else {
        coords.len()
    };
    if distinct < 3 {
        return Err(ConstraintError::InvalidGeometry(
            "ring has fewer than three vertices".to_string(),
        ));
    }

    Ok(LineString::new(coords))
}

/// `geo` multipolygon as GeoJSON: a Polygon for a single member, else a
/// MultiPolygon. `None` when empty.
pub fn from_geo(multi: &MultiPolygon<f64>) -> Option<Geometry> {
    let mut polygons: Vec<Vec<Ring>> = multi.0.iter().map(polygon_positions).collect();
    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(|p| Geometry::new(Value::Polygon(p))),
        _ => Some(Geometry::new(Value::MultiPolygon(polygons))),
    }
}

fn polygon_positions(polygon: &Polygon<f64>) -> Vec<Ring> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ls| ls.coords().map(|c| vec![c.x, c.y]).collect())
        .collect()
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
