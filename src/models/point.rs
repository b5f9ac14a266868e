//! Input point records and coordinate validation.

use geo::Point;
use serde::{Deserialize, Serialize};

/// Parse a raw coordinate cell.
///
/// Surrounding whitespace is ignored. Empty, non-numeric and non-finite
/// values are treated as missing.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// True iff both coordinates are present and within WGS84 range (bounds inclusive).
pub fn is_valid_coordinate(latitude: Option<f64>, longitude: Option<f64>) -> bool {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon),
        _ => false,
    }
}

/// One row of the point table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    /// Position in the input
    pub id: usize,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Raw cells of the input row, written back untouched
    pub fields: Vec<String>,
    valid: bool,
}

impl PointRecord {
    pub fn new(
        id: usize,
        latitude: Option<f64>,
        longitude: Option<f64>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            id,
            latitude,
            longitude,
            fields,
            valid: is_valid_coordinate(latitude, longitude),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Geographic location as (lon, lat), only for valid records
    pub fn location(&self) -> Option<Point<f64>> {
        if !self.valid {
            return None;
        }
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Some(Point::new(lon, lat)),
            _ => None,
        }
    }
}

/// The point source: column headers plus the ordered records.
#[derive(Debug, Clone, Default)]
pub struct PointTable {
    pub headers: Vec<String>,
    pub records: Vec<PointRecord>,
}

impl PointTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_valid()).count()
    }
}
