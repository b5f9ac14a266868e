//! Pipeline configuration.
//!
//! Resolved once at startup and passed into the pipeline by reference;
//! nothing reads process-wide state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GeocodeError, Result};
use crate::models::{LayerKind, LayerName};
use crate::projection::INDIA_LCC;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub points: PointSourceConfig,
    pub output: OutputConfig,
    pub layers: Vec<LayerConfig>,
    pub postal: LayerConfig,

    /// PROJ.4 definition of the planar space used for nearest search
    #[serde(default = "default_projection")]
    pub projection: String,

    #[serde(default)]
    pub capital_strategy: FacilityStrategy,

    #[serde(default)]
    pub hq_strategy: FacilityStrategy,

    /// State → capital, applied only when no capital was resolved
    #[serde(default)]
    pub capital_overrides: BTreeMap<String, String>,

    #[serde(default)]
    pub disputed: DisputedConfig,

    /// Worker threads for point resolution (default: all cores)
    #[serde(default)]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSourceConfig {
    pub path: PathBuf,
    #[serde(default = "default_latitude_field")]
    pub latitude_field: String,
    #[serde(default = "default_longitude_field")]
    pub longitude_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

/// One reference layer: where it lives, which column labels it, what it holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: LayerName,
    pub path: PathBuf,
    pub attribute: String,
    pub kind: LayerKind,
}

impl LayerConfig {
    pub fn new(name: LayerName, path: impl Into<PathBuf>, attribute: &str) -> Self {
        Self {
            name,
            path: path.into(),
            attribute: attribute.to_string(),
            kind: name.kind(),
        }
    }
}

/// How a facility field is filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStrategy {
    /// Join facilities to their enclosing area polygon, then match the
    /// point's resolved area name (normalized)
    #[default]
    Lookup,
    /// Closest facility in the planar projection
    Nearest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputedConfig {
    /// Substring searched (case-insensitively) in the resolved state
    pub marker: String,
    /// Value written into every resolved field of a disputed record
    pub sentinel: String,
}

impl Default for DisputedConfig {
    fn default() -> Self {
        Self {
            marker: "DISPUTED".to_string(),
            sentinel: "DISPUTED".to_string(),
        }
    }
}

fn default_projection() -> String {
    INDIA_LCC.to_string()
}

fn default_latitude_field() -> String {
    "latitude".to_string()
}

fn default_longitude_field() -> String {
    "longitude".to_string()
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GeocodeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reference deployment: India boundaries, PIN code polygons,
    /// Chandigarh as the shared capital of Haryana and Punjab.
    pub fn reference() -> Self {
        let mut capital_overrides = BTreeMap::new();
        capital_overrides.insert("HARYANA".to_string(), "CHANDIGARH".to_string());
        capital_overrides.insert("PUNJAB".to_string(), "CHANDIGARH".to_string());

        Self {
            points: PointSourceConfig {
                path: PathBuf::from("database.csv"),
                latitude_field: default_latitude_field(),
                longitude_field: default_longitude_field(),
            },
            output: OutputConfig {
                path: PathBuf::from("reverse_geocoded_database.csv"),
            },
            layers: vec![
                LayerConfig::new(LayerName::State, "STATE_BOUNDARY.shp", "STATE"),
                LayerConfig::new(LayerName::District, "DISTRICT_BOUNDARY.shp", "DISTRICT"),
                LayerConfig::new(LayerName::Subdistrict, "SUBDISTRICT_BOUNDARY.shp", "Sub_dist"),
                LayerConfig::new(LayerName::StateCapital, "STATE_HQ.shp", "CAPITAL_NA"),
                LayerConfig::new(LayerName::DistrictHq, "DISTRICT_HQ.shp", "HQ"),
            ],
            postal: LayerConfig::new(
                LayerName::Postal,
                "All_India_pincode_Boundary.geojson",
                "Pincode",
            ),
            projection: default_projection(),
            capital_strategy: FacilityStrategy::Lookup,
            hq_strategy: FacilityStrategy::Lookup,
            capital_overrides,
            disputed: DisputedConfig::default(),
            threads: None,
        }
    }

    /// Configuration entry for a reference layer
    pub fn layer(&self, name: LayerName) -> Result<&LayerConfig> {
        if name == LayerName::Postal {
            return Ok(&self.postal);
        }
        self.layers
            .iter()
            .find(|l| l.name == name)
            .ok_or(GeocodeError::MissingLayer(name))
    }

    /// Output column holding the postal code
    pub fn postal_column(&self) -> &str {
        &self.postal.attribute
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        for name in LayerName::reference() {
            let count = self.layers.iter().filter(|l| l.name == *name).count();
            match count {
                0 => return Err(GeocodeError::MissingLayer(*name)),
                1 => {}
                _ => return Err(GeocodeError::DuplicateLayer(*name)),
            }
        }

        for layer in self.layers.iter().chain(std::iter::once(&self.postal)) {
            if layer.kind != layer.name.kind() {
                return Err(GeocodeError::LayerKindMismatch {
                    layer: layer.name,
                    expected: layer.name.kind(),
                    found: layer.kind,
                });
            }
            if layer.attribute.trim().is_empty() {
                return Err(GeocodeError::Config(format!(
                    "layer '{}' has an empty attribute column",
                    layer.name
                )));
            }
        }

        if let Some(postal) = self.layers.iter().find(|l| l.name == LayerName::Postal) {
            return Err(GeocodeError::Config(format!(
                "postal layer {} belongs in [postal], not [[layers]]",
                postal.path.display()
            )));
        }
        if self.postal.name != LayerName::Postal {
            return Err(GeocodeError::Config(format!(
                "[postal] must declare name = \"postal\", found '{}'",
                self.postal.name
            )));
        }

        if self.disputed.marker.trim().is_empty() {
            return Err(GeocodeError::Config("disputed marker is empty".to_string()));
        }
        if self.threads == Some(0) {
            return Err(GeocodeError::Config("threads must be at least 1".to_string()));
        }

        Ok(())
    }
}
