//! Error taxonomy for the geocoding pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{LayerKind, LayerName};

/// Errors raised while configuring or running the pipeline.
///
/// Per-row conditions (invalid coordinates, overlapping polygons) are not
/// errors: they flow through as null fields and are only counted.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// A reference layer source does not exist.
    #[error("reference layer '{layer}' not found at {}", path.display())]
    MissingLayerFile { layer: String, path: PathBuf },

    /// The declared attribute column is absent from a layer.
    #[error("attribute column '{column}' missing in layer '{layer}'")]
    MissingAttribute { layer: String, column: String },

    /// A required layer has no entry in the configuration.
    #[error("layer '{0}' is not configured")]
    MissingLayer(LayerName),

    /// A layer appears more than once in the configuration.
    #[error("layer '{0}' is configured more than once")]
    DuplicateLayer(LayerName),

    /// A layer is declared with a kind its role does not allow.
    #[error("layer '{layer}' must be a {expected} layer, configured as {found}")]
    LayerKindMismatch {
        layer: LayerName,
        expected: LayerKind,
        found: LayerKind,
    },

    /// A feature's geometry does not match the declared layer kind.
    #[error("feature {index} of layer '{layer}' is not a {expected} geometry")]
    GeometryMismatch {
        layer: String,
        index: usize,
        expected: LayerKind,
    },

    /// The layer source could not be interpreted.
    #[error("unsupported layer source {}: {reason}", path.display())]
    UnsupportedLayer { path: PathBuf, reason: String },

    /// Any other configuration problem.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The point source lacks a required coordinate column.
    #[error("point source is missing required column '{0}'")]
    MissingCoordinateField(String),

    /// The projection collaborator could not transform a coordinate.
    #[error("projection failed: {0}")]
    Projection(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Shapefile(#[from] shapefile::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl GeocodeError {
    /// True for errors caused by the configuration or reference layers.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            GeocodeError::MissingLayerFile { .. }
                | GeocodeError::MissingAttribute { .. }
                | GeocodeError::MissingLayer(_)
                | GeocodeError::DuplicateLayer(_)
                | GeocodeError::LayerKindMismatch { .. }
                | GeocodeError::GeometryMismatch { .. }
                | GeocodeError::UnsupportedLayer { .. }
                | GeocodeError::Config(_)
                | GeocodeError::Toml(_)
        )
    }

    /// True for errors caused by the point source.
    pub fn is_input(&self) -> bool {
        matches!(self, GeocodeError::MissingCoordinateField(_))
    }
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
