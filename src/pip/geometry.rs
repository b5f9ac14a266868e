//! Geometry primitives: containment, planar distance, bounding boxes.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, MultiPolygon, Point};

/// A coordinate in the projected planar space
pub type PlanarPoint = [f64; 2];

/// Planar point-in-polygon test.
///
/// Each part of the multipolygon is tested on its own: the point is
/// contained if it lies inside some part and outside that part's holes.
/// A point exactly on any ring, outer or hole, counts as contained.
pub fn contains(geometry: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    geometry
        .0
        .iter()
        .any(|part| part.coordinate_position(&point.0) != CoordPos::Outside)
}

/// Euclidean distance between two projected points.
///
/// Only meaningful for planar coordinates; never call it with lon/lat.
pub fn distance(a: PlanarPoint, b: PlanarPoint) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Axis-aligned bounding box as `(min_x, min_y, max_x, max_y)`.
/// `None` for an empty geometry.
pub fn bounding_box(geometry: &MultiPolygon<f64>) -> Option<(f64, f64, f64, f64)> {
    geometry
        .bounding_rect()
        .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}
