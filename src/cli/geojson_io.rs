//! Reading and writing GeoJSON files for the CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{feature, FeatureCollection, GeoJson, Geometry};
use serde_json::{json, Value};

use zonemap::geometry::close_rings;
use zonemap::Zone;

pub fn read_geojson(path: &Path) -> Result<GeoJson> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    content
        .parse::<GeoJson>()
        .with_context(|| format!("{} is not valid GeoJSON", path.display()))
}

/// The geometry itself, a feature's geometry, or the first feature's
pub fn first_geometry(geojson: GeoJson) -> Option<Geometry> {
    match geojson {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|f| f.geometry),
    }
}

/// Zones from a FeatureCollection whose properties follow the zone schema.
///
/// Features without an `id` property take the feature id, else their
/// position in the collection (1-based).
pub fn zones_from_collection(collection: &FeatureCollection) -> Result<Vec<Zone>> {
    collection
        .features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let mut object = feature.properties.clone().unwrap_or_default();
            if !object.contains_key("id") {
                let id = match &feature.id {
                    Some(feature::Id::Number(n)) => n.as_i64(),
                    Some(feature::Id::String(s)) => s.parse().ok(),
                    None => None,
                }
                .unwrap_or(i as i64 + 1);
                object.insert("id".to_string(), json!(id));
            }
            let has_geometry = feature.geometry.is_some();
            object.insert("geometry".to_string(), serde_json::to_value(&feature.geometry)?);
            object
                .entry("has_geometry")
                .or_insert(Value::Bool(has_geometry));

            serde_json::from_value(Value::Object(object))
                .with_context(|| format!("Feature {} is not a zone", i))
        })
        .collect()
}

pub fn read_zones(path: &Path) -> Result<Vec<Zone>> {
    match read_geojson(path)? {
        GeoJson::FeatureCollection(collection) => zones_from_collection(&collection),
        _ => anyhow::bail!("{} must be a FeatureCollection", path.display()),
    }
}

/// Close every ring in every geometry of the document
pub fn close_all(geojson: GeoJson) -> GeoJson {
    match geojson {
        GeoJson::Geometry(geometry) => GeoJson::Geometry(close_rings(geometry)),
        GeoJson::Feature(mut feature) => {
            feature.geometry = feature.geometry.map(close_rings);
            GeoJson::Feature(feature)
        }
        GeoJson::FeatureCollection(mut collection) => {
            for feature in collection.features.iter_mut() {
                feature.geometry = feature.geometry.take().map(close_rings);
            }
            GeoJson::FeatureCollection(collection)
        }
    }
}

/// Write to `out`, or stdout when no path is given
pub fn write_output(out: Option<&Path>, content: &[u8]) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content)?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Value as GeoValue;
    use zonemap::BoundaryType;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 7,
                "properties": { "boundary_type": "barangay", "label": "Poblacion" },
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 4]]] }
            },
            {
                "type": "Feature",
                "properties": { "id": 12, "code": "C1", "name": "Commercial" },
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn test_zones_from_collection() {
        let GeoJson::FeatureCollection(collection) = COLLECTION.parse::<GeoJson>().unwrap() else {
            panic!("expected a collection");
        };
        let zones = zones_from_collection(&collection).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id.0, 7);
        assert_eq!(zones[0].boundary_type, BoundaryType::Barangay);
        assert!(zones[0].has_geometry);
        assert_eq!(zones[1].id.0, 12);
        assert!(zones[1].geometry.is_none());
        assert!(zones[1].is_zoning());
    }

    #[test]
    fn test_close_all_closes_feature_rings() {
        let closed = close_all(COLLECTION.parse().unwrap());
        let geometry = first_geometry(closed).unwrap();
        match geometry.value {
            GeoValue::Polygon(rings) => {
                assert_eq!(rings[0].len(), 5);
                assert_eq!(rings[0].first(), rings[0].last());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
