//! Postal-code containment and disputed-territory masking.

use geo::Point;

use crate::models::{LayerName, PolygonLayer, ResolvedRecord};
use crate::pip::{resolve_level, LayerMatch, PolygonIndex};

/// Containment join against the postal-code polygons
pub struct PostalOverlay {
    index: PolygonIndex,
}

impl PostalOverlay {
    pub fn new(layer: PolygonLayer) -> Self {
        Self {
            index: PolygonIndex::build(layer),
        }
    }

    /// Postal code of the polygon containing the point, first match in layer order
    pub fn lookup(&self, point: &Point<f64>) -> Option<LayerMatch<'_>> {
        resolve_level(&self.index, LayerName::Postal, point)
    }

    pub fn index(&self) -> &PolygonIndex {
        &self.index
    }
}

/// Masks every resolved field of records whose state is flagged as disputed.
#[derive(Debug, Clone)]
pub struct DisputedMask {
    marker: String,
    sentinel: String,
}

impl DisputedMask {
    pub fn new(marker: &str, sentinel: &str) -> Self {
        Self {
            marker: marker.to_uppercase(),
            sentinel: sentinel.to_string(),
        }
    }

    /// Case-insensitive substring test against a state name
    pub fn is_disputed(&self, state: &str) -> bool {
        state.to_uppercase().contains(&self.marker)
    }

    /// Overwrite all six resolved fields with the sentinel when the state is
    /// disputed. Returns whether the record was masked.
    pub fn apply(&self, record: &mut ResolvedRecord) -> bool {
        if !record.state.as_deref().is_some_and(|s| self.is_disputed(s)) {
            return false;
        }

        for field in [
            &mut record.state,
            &mut record.district,
            &mut record.subdistrict,
            &mut record.district_hq,
            &mut record.state_capital,
            &mut record.postal_code,
        ] {
            *field = Some(self.sentinel.clone());
        }
        record.capital_distance = None;
        record.hq_distance = None;
        record.capital_overridden = false;
        record.disputed = true;
        true
    }
}
