//! Point-in-Polygon (PIP) and nearest-facility lookups.
//!
//! Reference layers are indexed once in R-trees; every query is pruned
//! by bounding box and confirmed with the exact predicate.

mod geometry;
mod index;
mod nearest;
mod service;

pub use geometry::{bounding_box, contains, distance, PlanarPoint};
pub use index::{Containment, FacilityIndex, Nearest, PolygonIndex};
pub use nearest::{Facility, NearestFacilityResolver};
pub use service::{resolve_level, Hierarchy, HierarchyResolver, LayerMatch};
