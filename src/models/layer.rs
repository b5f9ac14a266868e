//! Reference layer types: named collections of `(attribute, geometry)` pairs.

use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};

use crate::error::{GeocodeError, Result};

/// Role of a reference layer in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LayerName {
    /// State / union territory polygons
    State,
    /// District polygons
    District,
    /// Sub-district (tehsil / taluk) polygons
    Subdistrict,
    /// State capital points
    StateCapital,
    /// District headquarters points
    DistrictHq,
    /// Postal code polygons
    Postal,
}

impl LayerName {
    /// Layers every configuration must declare in its `layers` table
    pub fn reference() -> &'static [LayerName] {
        &[
            LayerName::State,
            LayerName::District,
            LayerName::Subdistrict,
            LayerName::StateCapital,
            LayerName::DistrictHq,
        ]
    }

    /// Administrative levels resolved by containment, coarsest first
    pub fn hierarchy() -> &'static [LayerName] {
        &[LayerName::State, LayerName::District, LayerName::Subdistrict]
    }

    /// Geometry kind this role requires
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerName::StateCapital | LayerName::DistrictHq => LayerKind::Point,
            _ => LayerKind::Polygon,
        }
    }

    /// Get the field name for this layer
    pub fn field_name(&self) -> &'static str {
        match self {
            LayerName::State => "state",
            LayerName::District => "district",
            LayerName::Subdistrict => "subdistrict",
            LayerName::StateCapital => "state_capital",
            LayerName::DistrictHq => "district_hq",
            LayerName::Postal => "postal",
        }
    }
}

impl std::fmt::Display for LayerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Geometry kind of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Polygon,
    Point,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::Polygon => write!(f, "polygon"),
            LayerKind::Point => write!(f, "point"),
        }
    }
}

/// Geometry of a loaded feature, in geographic coordinates (lon, lat)
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Polygon(MultiPolygon<f64>),
    Point(Point<f64>),
}

impl FeatureGeometry {
    pub fn kind(&self) -> LayerKind {
        match self {
            FeatureGeometry::Polygon(_) => LayerKind::Polygon,
            FeatureGeometry::Point(_) => LayerKind::Point,
        }
    }
}

/// A single `{attribute, geometry}` record as delivered by a layer loader
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub attribute: String,
    pub geometry: FeatureGeometry,
}

impl Feature {
    pub fn polygon(attribute: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            attribute: attribute.into(),
            geometry: FeatureGeometry::Polygon(geometry),
        }
    }

    pub fn point(attribute: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            attribute: attribute.into(),
            geometry: FeatureGeometry::Point(Point::new(lon, lat)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolygonFeature {
    pub attribute: String,
    pub geometry: MultiPolygon<f64>,
}

/// Polygon layer. Feature order is the input order and decides
/// which polygon wins when several contain the same point.
#[derive(Debug, Clone)]
pub struct PolygonLayer {
    pub name: String,
    pub features: Vec<PolygonFeature>,
}

impl PolygonLayer {
    /// Build a polygon layer, rejecting any point feature.
    pub fn from_features(name: impl Into<String>, features: Vec<Feature>) -> Result<Self> {
        let name = name.into();
        let features = features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| match feature.geometry {
                FeatureGeometry::Polygon(geometry) => Ok(PolygonFeature {
                    attribute: feature.attribute,
                    geometry,
                }),
                FeatureGeometry::Point(_) => Err(GeocodeError::GeometryMismatch {
                    layer: name.clone(),
                    index,
                    expected: LayerKind::Polygon,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { name, features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PointFeature {
    pub attribute: String,
    pub location: Point<f64>,
}

/// Point (facility) layer. Feature order breaks distance ties.
#[derive(Debug, Clone)]
pub struct PointLayer {
    pub name: String,
    pub features: Vec<PointFeature>,
}

impl PointLayer {
    /// Build a point layer, rejecting any polygon feature.
    pub fn from_features(name: impl Into<String>, features: Vec<Feature>) -> Result<Self> {
        let name = name.into();
        let features = features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| match feature.geometry {
                FeatureGeometry::Point(location) => Ok(PointFeature {
                    attribute: feature.attribute,
                    location,
                }),
                FeatureGeometry::Polygon(_) => Err(GeocodeError::GeometryMismatch {
                    layer: name.clone(),
                    index,
                    expected: LayerKind::Point,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { name, features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_reference_layers_kinds() {
        assert_eq!(LayerName::State.kind(), LayerKind::Polygon);
        assert_eq!(LayerName::DistrictHq.kind(), LayerKind::Point);
        assert_eq!(LayerName::StateCapital.kind(), LayerKind::Point);
        assert!(!LayerName::reference().contains(&LayerName::Postal));
    }

    #[test]
    fn test_polygon_layer_rejects_points() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let features = vec![
            Feature::polygon("A", MultiPolygon::new(vec![square])),
            Feature::point("B", 0.5, 0.5),
        ];

        let err = PolygonLayer::from_features("district", features).unwrap_err();
        assert!(matches!(
            err,
            GeocodeError::GeometryMismatch { index: 1, .. }
        ));
    }

    #[test]
    fn test_point_layer_keeps_order() {
        let features = vec![Feature::point("A", 1.0, 0.0), Feature::point("B", -1.0, 0.0)];
        let layer = PointLayer::from_features("state_capital", features).unwrap();
        assert_eq!(layer.features[0].attribute, "A");
        assert_eq!(layer.features[1].attribute, "B");
    }
}
