//! Clipping of zone geometry against its boundary and neighbouring zones.

use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon};
use geojson::Geometry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ConstraintConfig;
use crate::error::ConstraintError;
use crate::geometry::{close_rings, from_geo, to_geo};

/// How overlaps with neighbouring zones are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimStrategy {
    /// Subtract each neighbour in turn, in enumeration order
    #[default]
    Sequential,
    /// Subtract the union of all neighbours once
    Union,
}

/// Area bookkeeping for a successful constraint pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintReport {
    pub original_area: f64,
    pub final_area: f64,
    /// `final_area / original_area`
    pub retained_ratio: f64,
    pub clipped_to_boundary: bool,
    /// Neighbours whose bounding box touched the shape and were subtracted
    pub trimmed_against: usize,
}

/// A clipped geometry and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct Constrained {
    pub geometry: Geometry,
    pub report: ConstraintReport,
}

#[derive(Debug, Clone)]
pub struct ConstraintEngine {
    strategy: TrimStrategy,
    min_area: f64,
}

impl Default for ConstraintEngine {
    fn default() -> Self {
        Self::from_config(&ConstraintConfig::default())
    }
}

impl ConstraintEngine {
    pub fn new(strategy: TrimStrategy, min_area: f64) -> Self {
        Self { strategy, min_area }
    }

    pub fn from_config(config: &ConstraintConfig) -> Self {
        Self::new(config.trim_strategy, config.min_area)
    }

    pub fn strategy(&self) -> TrimStrategy {
        self.strategy
    }

    /// Clip `candidate` to `boundary` and remove its overlap with `others`.
    ///
    /// Nothing partial is ever returned: the result is either the fully
    /// constrained shape or the reason it was rejected.
    pub fn constrain(
        &self,
        candidate: &Geometry,
        boundary: Option<&Geometry>,
        others: &[&Geometry],
    ) -> Result<Geometry, ConstraintError> {
        self.constrain_with_report(candidate, boundary, others)
            .map(|c| c.geometry)
    }

    pub fn constrain_with_report(
        &self,
        candidate: &Geometry,
        boundary: Option<&Geometry>,
        others: &[&Geometry],
    ) -> Result<Constrained, ConstraintError> {
        let mut current = to_geo(&close_rings(candidate.clone()))?;
        let original_area = current.unsigned_area();
        if original_area <= self.min_area {
            return Err(ConstraintError::InvalidGeometry(
                "shape has no area".to_string(),
            ));
        }

        let clipped_to_boundary = match boundary {
            Some(boundary) => {
                let boundary = to_geo(&close_rings(boundary.clone()))?;
                current = current.intersection(&boundary);
                if self.is_empty(&current) {
                    debug!("Candidate lies outside its boundary");
                    return Err(ConstraintError::OutsideBoundary);
                }
                true
            }
            None => false,
        };

        let neighbours: Vec<MultiPolygon<f64>> = others
            .iter()
            .filter_map(|g| match to_geo(&close_rings((*g).clone())) {
                Ok(mp) => Some(mp),
                Err(e) => {
                    warn!("Ignoring neighbour with unusable geometry: {}", e);
                    None
                }
            })
            .collect();

        let trimmed_against = match self.strategy {
            TrimStrategy::Sequential => self.trim_sequential(&mut current, &neighbours)?,
            TrimStrategy::Union => self.trim_union(&mut current, &neighbours)?,
        };

        // Drop slivers left behind by the boolean ops
        current.0.retain(|p| p.unsigned_area() > self.min_area);
        let final_area = current.unsigned_area();
        let geometry = from_geo(&current).ok_or(ConstraintError::FullyCovered)?;

        debug!(
            "Constrained shape: {:.3e} -> {:.3e} ({} neighbours trimmed)",
            original_area, final_area, trimmed_against
        );

        Ok(Constrained {
            geometry,
            report: ConstraintReport {
                original_area,
                final_area,
                retained_ratio: final_area / original_area,
                clipped_to_boundary,
                trimmed_against,
            },
        })
    }

    fn trim_sequential(
        &self,
        current: &mut MultiPolygon<f64>,
        neighbours: &[MultiPolygon<f64>],
    ) -> Result<usize, ConstraintError> {
        let mut trimmed = 0;
        for neighbour in neighbours {
            if !bboxes_intersect(current, neighbour) {
                continue;
            }
            *current = current.difference(neighbour);
            trimmed += 1;
            if self.is_empty(current) {
                return Err(ConstraintError::FullyCovered);
            }
        }
        Ok(trimmed)
    }

    fn trim_union(
        &self,
        current: &mut MultiPolygon<f64>,
        neighbours: &[MultiPolygon<f64>],
    ) -> Result<usize, ConstraintError> {
        let touching: Vec<&MultiPolygon<f64>> = neighbours
            .iter()
            .filter(|n| bboxes_intersect(current, n))
            .collect();
        if touching.is_empty() {
            return Ok(0);
        }

        let union = touching
            .iter()
            .fold(MultiPolygon::new(vec![]), |acc, n| acc.union(*n));
        *current = current.difference(&union);
        if self.is_empty(current) {
            return Err(ConstraintError::FullyCovered);
        }
        Ok(touching.len())
    }

    fn is_empty(&self, geometry: &MultiPolygon<f64>) -> bool {
        geometry.0.is_empty() || geometry.unsigned_area() <= self.min_area
    }
}

fn bboxes_intersect(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Value;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![x0, y0],
            vec![x1, y0],
            vec![x1, y1],
            vec![x0, y1],
            vec![x0, y0],
        ]]))
    }

    fn area(g: &Geometry) -> f64 {
        to_geo(g).unwrap().unsigned_area()
    }

    fn assert_same_shape(a: &Geometry, b: &Geometry) {
        let a = to_geo(a).unwrap();
        let b = to_geo(b).unwrap();
        let xor = a.xor(&b).unsigned_area();
        assert!(xor < 1e-9, "shapes differ by area {}", xor);
    }

    #[test]
    fn test_disjoint_boundary_is_outside() {
        let engine = ConstraintEngine::default();
        let result = engine.constrain(
            &rect(0.0, 0.0, 1.0, 1.0),
            Some(&rect(5.0, 5.0, 6.0, 6.0)),
            &[],
        );
        assert_eq!(result, Err(ConstraintError::OutsideBoundary));
    }

    #[test]
    fn test_candidate_inside_zone_is_fully_covered() {
        let engine = ConstraintEngine::default();
        let zone = rect(0.0, 0.0, 10.0, 10.0);
        let result = engine.constrain(&rect(2.0, 2.0, 4.0, 4.0), None, &[&zone]);
        assert_eq!(result, Err(ConstraintError::FullyCovered));
    }

    #[test]
    fn test_no_neighbours_returns_intersection() {
        let engine = ConstraintEngine::default();
        let candidate = rect(0.0, 0.0, 2.0, 2.0);
        let boundary = rect(1.0, 1.0, 3.0, 3.0);
        let clipped = engine.constrain(&candidate, Some(&boundary), &[]).unwrap();
        assert_same_shape(&clipped, &rect(1.0, 1.0, 2.0, 2.0));
    }

    #[test]
    fn test_candidate_inside_boundary_is_unchanged() {
        let engine = ConstraintEngine::default();
        let barangay_a = rect(0.0, 0.0, 10.0, 10.0);
        let drawn = rect(2.0, 3.0, 5.0, 7.0);
        let constrained = engine
            .constrain_with_report(&drawn, Some(&barangay_a), &[])
            .unwrap();
        assert_same_shape(&constrained.geometry, &drawn);
        assert!(constrained.report.clipped_to_boundary);
        assert!((constrained.report.retained_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_with_existing_zone_is_trimmed() {
        let engine = ConstraintEngine::default();
        let drawn = rect(0.0, 0.0, 10.0, 1.0);
        // Covers 40% of the drawn shape
        let zone_x = rect(6.0, -1.0, 12.0, 2.0);
        let constrained = engine
            .constrain_with_report(&drawn, None, &[&zone_x])
            .unwrap();

        assert_same_shape(&constrained.geometry, &rect(0.0, 0.0, 6.0, 1.0));
        assert!((constrained.report.retained_ratio - 0.6).abs() < 1e-9);
        assert_eq!(constrained.report.trimmed_against, 1);
    }

    #[test]
    fn test_result_rings_are_closed() {
        let engine = ConstraintEngine::default();
        let open = Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![4.0, 0.0],
            vec![4.0, 4.0],
            vec![0.0, 4.0],
        ]]));
        let clipped = engine
            .constrain(&open, None, &[&rect(3.0, 0.0, 5.0, 4.0)])
            .unwrap();
        let Value::Polygon(rings) = &clipped.value else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].first(), rings[0].last());
        assert!((area(&clipped) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_result_is_multipolygon() {
        let engine = ConstraintEngine::default();
        let drawn = rect(0.0, 0.0, 3.0, 1.0);
        let middle = rect(1.0, -1.0, 2.0, 2.0);
        let clipped = engine.constrain(&drawn, None, &[&middle]).unwrap();
        match &clipped.value {
            Value::MultiPolygon(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected multipolygon, got {:?}", other),
        }
        assert!((area(&clipped) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_far_neighbours_are_not_counted() {
        let engine = ConstraintEngine::default();
        let far = rect(50.0, 50.0, 51.0, 51.0);
        let constrained = engine
            .constrain_with_report(&rect(0.0, 0.0, 1.0, 1.0), None, &[&far])
            .unwrap();
        assert_eq!(constrained.report.trimmed_against, 0);
    }

    #[test]
    fn test_covered_by_two_neighbours_together() {
        let drawn = rect(0.0, 0.0, 2.0, 1.0);
        let left = rect(-1.0, -1.0, 1.0, 2.0);
        let right = rect(1.0, -1.0, 3.0, 2.0);

        for strategy in [TrimStrategy::Sequential, TrimStrategy::Union] {
            let engine = ConstraintEngine::new(strategy, 1e-12);
            assert_eq!(
                engine.constrain(&drawn, None, &[&left, &right]),
                Err(ConstraintError::FullyCovered),
                "{:?}",
                strategy
            );
        }
    }

    #[test]
    fn test_strategies_agree_on_overlapping_neighbours() {
        let drawn = rect(0.0, 0.0, 10.0, 10.0);
        let a = rect(-1.0, -1.0, 4.0, 4.0);
        let b = rect(3.0, 3.0, 6.0, 6.0);

        let sequential = ConstraintEngine::new(TrimStrategy::Sequential, 1e-12)
            .constrain(&drawn, None, &[&a, &b])
            .unwrap();
        let union = ConstraintEngine::new(TrimStrategy::Union, 1e-12)
            .constrain(&drawn, None, &[&a, &b])
            .unwrap();
        assert_same_shape(&sequential, &union);
        // 100 - 16 - 9 + 1
        assert!((area(&sequential) - 76.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_candidate_is_invalid() {
        let engine = ConstraintEngine::default();
        let line = Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]));
        assert!(matches!(
            engine.constrain(&line, None, &[]),
            Err(ConstraintError::InvalidGeometry(_))
        ));

        let flat = Geometry::new(Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![0.0, 0.0],
        ]]));
        assert!(matches!(
            engine.constrain(&flat, None, &[]),
            Err(ConstraintError::InvalidGeometry(_))
        ));
    }
}
