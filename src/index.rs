//! Spatial index over zone and boundary geometries.

use geo::{Area, BooleanOps, BoundingRect, Contains, MultiPolygon, Point, Rect};
use hashbrown::HashSet;
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{Zone, ZoneId};

/// Wrapper for R-tree indexing of zone geometries
#[derive(Clone)]
pub struct IndexedZone {
    pub id: ZoneId,
    pub geometry: Arc<MultiPolygon<f64>>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedZone {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedZone {
    pub fn new(id: ZoneId, geometry: MultiPolygon<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        Some(Self {
            id,
            geometry: Arc::new(geometry),
            envelope: rect_envelope(&rect),
        })
    }
}

fn rect_envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// R-tree of zone bounding boxes with exact-geometry refinement
pub struct ZoneIndex {
    tree: RTree<IndexedZone>,
}

impl ZoneIndex {
    /// Build the index from every zone that carries a usable geometry
    pub fn build<'a, I>(zones: I) -> Self
    where
        I: IntoIterator<Item = &'a Zone>,
    {
        let indexed: Vec<IndexedZone> = zones
            .into_iter()
            .filter_map(|zone| match zone.geo()? {
                Ok(geometry) => IndexedZone::new(zone.id, geometry),
                Err(e) => {
                    warn!("Skipping zone {} with unusable geometry: {}", zone.id, e);
                    None
                }
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        debug!("Zone index built with {} entries", tree.size());
        Self { tree }
    }

    /// Ids of zones whose bounding box intersects `rect`
    pub fn in_rect(&self, rect: &Rect<f64>) -> HashSet<ZoneId> {
        self.tree
            .locate_in_envelope_intersecting(&rect_envelope(rect))
            .map(|iz| iz.id)
            .collect()
    }

    /// Find all zones containing a point
    pub fn lookup(&self, lon: f64, lat: f64) -> Vec<ZoneId> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|iz| iz.geometry.contains(&point))
            .map(|iz| iz.id)
            .collect()
    }

    /// Indexed zones whose bounding box intersects the geometry's
    pub fn candidates(&self, geometry: &MultiPolygon<f64>) -> Vec<&IndexedZone> {
        match geometry.bounding_rect() {
            Some(rect) => self
                .tree
                .locate_in_envelope_intersecting(&rect_envelope(&rect))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The zone sharing the largest area with `geometry`, if any overlap
    pub fn best_container(&self, geometry: &MultiPolygon<f64>) -> Option<ZoneId> {
        self.candidates(geometry)
            .into_iter()
            .map(|iz| (iz.id, iz.geometry.intersection(geometry).unsigned_area()))
            .filter(|(_, area)| *area > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedZone> {
        self.tree.iter()
    }
}
