//! Nearest-facility resolver over a projected point layer.

use super::{FacilityIndex, PlanarPoint};
use crate::error::Result;
use crate::models::PointLayer;
use crate::projection::Projection;

/// A resolved facility and its planar distance from the query point
#[derive(Debug, Clone, PartialEq)]
pub struct Facility<'a> {
    pub name: &'a str,
    pub distance: f64,
}

/// Nearest-neighbour join against one facility layer
pub struct NearestFacilityResolver {
    index: FacilityIndex,
}

impl NearestFacilityResolver {
    pub fn new(layer: PointLayer, projection: &dyn Projection) -> Result<Self> {
        Ok(Self {
            index: FacilityIndex::build(layer, projection)?,
        })
    }

    /// Closest facility to an already projected point.
    ///
    /// Equidistant facilities resolve to the earliest in layer order.
    /// Only an empty layer yields `None`.
    pub fn resolve(&self, query: PlanarPoint) -> Option<Facility<'_>> {
        self.index.nearest(query).map(|hit| Facility {
            name: self.index.attribute(hit.id),
            distance: hit.distance,
        })
    }

    pub fn index(&self) -> &FacilityIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;

    fn identity(lon: f64, lat: f64) -> PlanarPoint {
        [lon, lat]
    }

    fn capitals(points: &[(&str, f64, f64)]) -> NearestFacilityResolver {
        let features = points
            .iter()
            .map(|(name, x, y)| Feature::point(*name, *x, *y))
            .collect();
        let layer = PointLayer::from_features("state_capital", features).unwrap();
        NearestFacilityResolver::new(layer, &identity).unwrap()
    }

    #[test]
    fn test_equidistant_capitals_first_wins() {
        let resolver = capitals(&[("A", 0.0, 2.0), ("B", 0.0, -2.0)]);
        let facility = resolver.resolve([0.0, 0.0]).unwrap();
        assert_eq!(facility.name, "A");
        assert_eq!(facility.distance, 2.0);
    }

    #[test]
    fn test_reports_minimum_distance() {
        let resolver = capitals(&[("FAR", 10.0, 10.0), ("NEAR", 3.0, 4.0)]);
        let facility = resolver.resolve([0.0, 0.0]).unwrap();
        assert_eq!(facility.name, "NEAR");
        assert_eq!(facility.distance, 5.0);
    }

    #[test]
    fn test_projection_changes_ranking() {
        // In degrees "EAST" is closer; after squashing longitude "NORTH" wins
        let features = vec![Feature::point("NORTH", 0.0, 1.5), Feature::point("EAST", 1.0, 0.0)];
        let layer = PointLayer::from_features("district_hq", features).unwrap();
        let squash = |lon: f64, lat: f64| [lon * 2.0, lat];
        let resolver = NearestFacilityResolver::new(layer, &squash).unwrap();
        let query = squash.project(0.0, 0.0).unwrap();
        assert_eq!(resolver.resolve(query).unwrap().name, "NORTH");
    }

    #[test]
    fn test_empty_layer_yields_none() {
        let resolver = capitals(&[]);
        assert!(resolver.resolve([0.0, 0.0]).is_none());
    }
}
