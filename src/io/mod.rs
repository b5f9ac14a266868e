//! Adapters between files and the pipeline's typed records.
//!
//! Reference layers arrive through [`LayerLoader`], which turns any source
//! into a uniform list of `{attribute, geometry}` features. The point table
//! is read from and written back to CSV.

mod geojson;
mod points;
mod shp;

use hashbrown::HashMap;
use tracing::info;

pub use points::{read_points, write_output, write_records};

use crate::config::LayerConfig;
use crate::error::{GeocodeError, Result};
use crate::models::{Feature, LayerName, PointLayer, PolygonLayer};

/// Delivers the features of a configured reference layer.
pub trait LayerLoader {
    fn load(&self, config: &LayerConfig) -> Result<Vec<Feature>>;
}

/// Loads layers from ESRI shapefiles (`.shp`) or GeoJSON (`.geojson`, `.json`).
///
/// Geometries must already be in geographic coordinates (EPSG:4326).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLayerLoader;

impl LayerLoader for FileLayerLoader {
    fn load(&self, config: &LayerConfig) -> Result<Vec<Feature>> {
        let path = &config.path;
        if !path.exists() {
            return Err(GeocodeError::MissingLayerFile {
                layer: config.name.to_string(),
                path: path.clone(),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let features = match extension.as_deref() {
            Some("shp") => shp::read_features(path, config)?,
            Some("geojson") | Some("json") => geojson::read_features(path, config)?,
            _ => {
                return Err(GeocodeError::UnsupportedLayer {
                    path: path.clone(),
                    reason: "expected a .shp, .geojson or .json file".to_string(),
                })
            }
        };

        info!(
            "Loaded {} features from {} ({})",
            features.len(),
            path.display(),
            config.name
        );
        Ok(features)
    }
}

/// Layers held in memory, keyed by role
#[derive(Debug, Clone, Default)]
pub struct StaticLayerLoader {
    layers: HashMap<LayerName, Vec<Feature>>,
}

impl StaticLayerLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, name: LayerName, features: Vec<Feature>) -> Self {
        self.layers.insert(name, features);
        self
    }
}

impl LayerLoader for StaticLayerLoader {
    fn load(&self, config: &LayerConfig) -> Result<Vec<Feature>> {
        self.layers
            .get(&config.name)
            .cloned()
            .ok_or_else(|| GeocodeError::MissingLayerFile {
                layer: config.name.to_string(),
                path: config.path.clone(),
            })
    }
}

/// Load a configured layer as polygons
pub fn load_polygon_layer(loader: &dyn LayerLoader, config: &LayerConfig) -> Result<PolygonLayer> {
    PolygonLayer::from_features(config.name.to_string(), loader.load(config)?)
}

/// Load a configured layer as points
pub fn load_point_layer(loader: &dyn LayerLoader, config: &LayerConfig) -> Result<PointLayer> {
    PointLayer::from_features(config.name.to_string(), loader.load(config)?)
}

/// Render a numeric attribute the way it reads in the source table:
/// integral values without a fractional part (PIN codes stored as numbers).
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
