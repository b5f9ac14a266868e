//! PIP service for looking up the administrative hierarchy of a point.

use geo::Point;
use tracing::debug;

use super::{Containment, PolygonIndex};
use crate::models::{LayerName, PolygonLayer};

/// Attribute resolved from one polygon layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMatch<'a> {
    pub attribute: &'a str,
    /// More than one polygon of the layer contained the point
    pub ambiguous: bool,
}

/// State / district / sub-district for one point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hierarchy<'a> {
    pub state: Option<LayerMatch<'a>>,
    pub district: Option<LayerMatch<'a>>,
    pub subdistrict: Option<LayerMatch<'a>>,
}

impl<'a> Hierarchy<'a> {
    pub fn get(&self, level: LayerName) -> Option<LayerMatch<'a>> {
        match level {
            LayerName::State => self.state,
            LayerName::District => self.district,
            LayerName::Subdistrict => self.subdistrict,
            _ => None,
        }
    }

    /// Levels where the containment match was ambiguous
    pub fn ambiguous_levels(&self) -> Vec<LayerName> {
        LayerName::hierarchy()
            .iter()
            .copied()
            .filter(|level| self.get(*level).is_some_and(|m| m.ambiguous))
            .collect()
    }
}

/// Point-in-Polygon lookup over the three administrative layers.
///
/// Each level is resolved on its own: a sub-district is not required to
/// lie inside the resolved district.
pub struct HierarchyResolver {
    state: PolygonIndex,
    district: PolygonIndex,
    subdistrict: PolygonIndex,
}

impl HierarchyResolver {
    /// Build one index per administrative layer
    pub fn new(state: PolygonLayer, district: PolygonLayer, subdistrict: PolygonLayer) -> Self {
        Self {
            state: PolygonIndex::build(state),
            district: PolygonIndex::build(district),
            subdistrict: PolygonIndex::build(subdistrict),
        }
    }

    /// Build the admin hierarchy for a point given as (lon, lat)
    pub fn lookup(&self, point: &Point<f64>) -> Hierarchy<'_> {
        Hierarchy {
            state: resolve_level(&self.state, LayerName::State, point),
            district: resolve_level(&self.district, LayerName::District, point),
            subdistrict: resolve_level(&self.subdistrict, LayerName::Subdistrict, point),
        }
    }

    /// Get the index backing a level
    pub fn index(&self, level: LayerName) -> Option<&PolygonIndex> {
        match level {
            LayerName::State => Some(&self.state),
            LayerName::District => Some(&self.district),
            LayerName::Subdistrict => Some(&self.subdistrict),
            _ => None,
        }
    }
}

/// Containment join of one point against one polygon index
pub fn resolve_level<'a>(
    index: &'a PolygonIndex,
    level: LayerName,
    point: &Point<f64>,
) -> Option<LayerMatch<'a>> {
    let Containment { id, matches } = index.locate(point)?;
    let attribute = index.attribute(id);

    if matches > 1 {
        debug!(
            "{} polygons of layer '{}' contain ({}, {}); keeping '{}'",
            matches,
            level,
            point.x(),
            point.y(),
            attribute
        );
    }

    Some(LayerMatch {
        attribute,
        ambiguous: matches > 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use geo::{polygon, MultiPolygon};

    fn square(attribute: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Feature {
        Feature::polygon(
            attribute,
            MultiPolygon::new(vec![polygon![
                (x: min_x, y: min_y), (x: max_x, y: min_y), (x: max_x, y: max_y), (x: min_x, y: max_y)
            ]]),
        )
    }

    fn layer(name: &str, features: Vec<Feature>) -> PolygonLayer {
        PolygonLayer::from_features(name, features).unwrap()
    }

    fn resolver() -> HierarchyResolver {
        HierarchyResolver::new(
            layer("state", vec![square("DELHI", 76.8, 28.4, 77.4, 28.9)]),
            layer(
                "district",
                vec![
                    square("NEW DELHI", 77.1, 28.5, 77.3, 28.7),
                    square("SOUTH DELHI", 77.1, 28.4, 77.3, 28.55),
                ],
            ),
            // Sub-district deliberately outside the district polygons
            layer("subdistrict", vec![square("NARELA", 76.9, 28.75, 77.0, 28.85)]),
        )
    }

    #[test]
    fn test_empty_hierarchy() {
        let resolver = HierarchyResolver::new(
            layer("state", vec![]),
            layer("district", vec![]),
            layer("subdistrict", vec![]),
        );
        let hierarchy = resolver.lookup(&Point::new(77.2, 28.6));
        assert_eq!(hierarchy, Hierarchy::default());
    }

    #[test]
    fn test_delhi_state() {
        let resolver = resolver();
        let hierarchy = resolver.lookup(&Point::new(77.2, 28.6));
        assert_eq!(hierarchy.state.map(|m| m.attribute), Some("DELHI"));
        assert_eq!(hierarchy.district.map(|m| m.attribute), Some("NEW DELHI"));
        assert!(hierarchy.subdistrict.is_none());
        assert!(hierarchy.ambiguous_levels().is_empty());
    }

    #[test]
    fn test_levels_are_independent() {
        let resolver = resolver();
        let hierarchy = resolver.lookup(&Point::new(76.95, 28.8));
        assert_eq!(hierarchy.state.map(|m| m.attribute), Some("DELHI"));
        assert!(hierarchy.district.is_none());
        assert_eq!(hierarchy.subdistrict.map(|m| m.attribute), Some("NARELA"));
    }

    #[test]
    fn test_overlap_flagged() {
        // 28.52 lies in both district squares
        let resolver = resolver();
        let hierarchy = resolver.lookup(&Point::new(77.2, 28.52));
        let district = hierarchy.district.unwrap();
        assert_eq!(district.attribute, "NEW DELHI");
        assert!(district.ambiguous);
        assert_eq!(hierarchy.ambiguous_levels(), vec![LayerName::District]);
    }

    #[test]
    fn test_offshore_point() {
        let resolver = resolver();
        let hierarchy = resolver.lookup(&Point::new(72.0, 15.0));
        assert_eq!(hierarchy, Hierarchy::default());
    }
}
