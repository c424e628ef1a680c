//! Consistency checks over a whole zone set.

use geo::{Area, BooleanOps};
use serde::Serialize;
use tracing::info;

use crate::index::ZoneIndex;
use crate::models::{ZoneId, ZoneSet};

/// Two zoning zones sharing area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlap {
    pub first: ZoneId,
    pub second: ZoneId,
    pub area: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub overlaps: Vec<Overlap>,
    /// Zoning zones not lying within exactly one barangay
    pub uncontained: Vec<ZoneId>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.overlaps.is_empty() && self.uncontained.is_empty()
    }
}

/// Check that zoning zones do not overlap and each sits inside one barangay.
///
/// The containment check is skipped when the set has no barangays.
pub fn audit(zones: &ZoneSet, min_area: f64) -> AuditReport {
    let zoning = ZoneIndex::build(zones.zoning_zones());
    let barangays = ZoneIndex::build(zones.barangays());

    let mut report = AuditReport::default();

    for zone in zoning.iter() {
        for other in zoning.candidates(&zone.geometry) {
            if other.id <= zone.id {
                continue;
            }
            let area = zone.geometry.intersection(other.geometry.as_ref()).unsigned_area();
            if area > min_area {
                report.overlaps.push(Overlap {
                    first: zone.id,
                    second: other.id,
                    area,
                });
            }
        }

        if barangays.is_empty() {
            continue;
        }
        let zone_area = zone.geometry.unsigned_area();
        let containing = barangays
            .candidates(&zone.geometry)
            .into_iter()
            .filter(|b| {
                let inside = zone.geometry.intersection(b.geometry.as_ref()).unsigned_area();
                zone_area - inside <= min_area.max(zone_area * 1e-9)
            })
            .count();
        if containing != 1 {
            report.uncontained.push(zone.id);
        }
    }

    report.overlaps.sort_by_key(|o| (o.first, o.second));
    report.uncontained.sort();

    info!(
        "Audited {} zoning zones: {} overlaps, {} outside a single barangay",
        zoning.len(),
        report.overlaps.len(),
        report.uncontained.len()
    );

    report
}
