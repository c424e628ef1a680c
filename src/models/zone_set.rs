//! In-memory working set of zones and boundaries for an editing session.

use hashbrown::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{BoundaryType, Zone, ZoneId};

/// Every zone and boundary loaded for the current session.
///
/// Zones keep the order they were fetched in; overlap trimming walks
/// neighbours in this order.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
    by_id: HashMap<ZoneId, usize>,
    revision: u64,
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

impl ZoneSet {
    pub fn new(zones: Vec<Zone>) -> Self {
        let mut set = Self::default();
        set.replace_all(zones);
        set
    }

    /// Replace the whole set with a fresh fetch from the backend
    pub fn replace_all(&mut self, zones: Vec<Zone>) {
        self.zones = zones;
        self.reindex();
    }

    /// Changes on every mutation, unique across sets
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = NEXT_REVISION.fetch_add(1, Ordering::Relaxed);
    }

    fn reindex(&mut self) {
        self.touch();
        self.by_id = self
            .zones
            .iter()
            .enumerate()
            .map(|(i, z)| (z.id, i))
            .collect();
    }

    /// Insert a zone, or replace the record with the same id in place
    pub fn upsert(&mut self, zone: Zone) {
        self.touch();
        match self.by_id.get(&zone.id) {
            Some(&i) => self.zones[i] = zone,
            None => {
                self.by_id.insert(zone.id, self.zones.len());
                self.zones.push(zone);
            }
        }
    }

    pub fn remove(&mut self, id: ZoneId) -> Option<Zone> {
        let i = self.by_id.remove(&id)?;
        let zone = self.zones.remove(i);
        self.reindex();
        Some(zone)
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.by_id.get(&id).map(|&i| &self.zones[i])
    }

    /// Overwrite a zone's geometry; returns the previous value
    pub fn set_geometry(
        &mut self,
        id: ZoneId,
        geometry: Option<geojson::Geometry>,
    ) -> Option<Option<geojson::Geometry>> {
        let &i = self.by_id.get(&id)?;
        self.touch();
        let zone = &mut self.zones[i];
        zone.has_geometry = geometry.is_some();
        Some(std::mem::replace(&mut zone.geometry, geometry))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// The municipal boundary; the first one wins if the backend holds several
    pub fn municipal_boundary(&self) -> Option<&Zone> {
        self.zones
            .iter()
            .find(|z| z.boundary_type == BoundaryType::Municipal)
    }

    pub fn barangays(&self) -> impl Iterator<Item = &Zone> {
        self.zones
            .iter()
            .filter(|z| z.boundary_type == BoundaryType::Barangay)
    }

    pub fn zoning_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(|z| z.is_zoning())
    }

    /// Geometries of every zoning zone except `excluding`, in set order
    pub fn zoning_neighbours(&self, excluding: Option<ZoneId>) -> Vec<&geojson::Geometry> {
        self.zoning_zones()
            .filter(|z| Some(z.id) != excluding)
            .filter_map(|z| z.geometry.as_ref())
            .collect()
    }
}
