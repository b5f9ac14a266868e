//! Core data models for the geocoding pipeline.

pub mod layer;
pub mod point;
pub mod resolved;

pub use layer::{
    Feature, FeatureGeometry, LayerKind, LayerName, PointFeature, PointLayer, PolygonFeature,
    PolygonLayer,
};
pub use point::{is_valid_coordinate, parse_coordinate, PointRecord, PointTable};
pub use resolved::{ResolvedRecord, RESOLVED_COLUMNS};
