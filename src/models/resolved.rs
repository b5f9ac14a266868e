//! Resolved output record.

use serde::{Deserialize, Serialize};

use super::LayerName;

/// Output columns appended after the input columns, in order.
/// The postal column name comes from the postal layer's attribute.
pub const RESOLVED_COLUMNS: [&str; 5] = [
    "state",
    "district",
    "subdistrict",
    "district_hq",
    "state_capital",
];

/// Resolution result for one input point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    /// Position in the input
    pub id: usize,
    pub valid: bool,

    pub state: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub district_hq: Option<String>,
    pub state_capital: Option<String>,
    pub postal_code: Option<String>,

    /// Planar distance to the capital, when resolved by nearest search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_distance: Option<f64>,

    /// Planar distance to the HQ, when resolved by nearest search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hq_distance: Option<f64>,

    /// Layers where more than one polygon contained the point
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ambiguous: Vec<LayerName>,

    /// Capital was filled from the override table
    pub capital_overridden: bool,

    /// Record was masked as disputed territory
    pub disputed: bool,
}

impl ResolvedRecord {
    /// Record with every resolved field null
    pub fn unresolved(id: usize, valid: bool) -> Self {
        Self {
            id,
            valid,
            ..Default::default()
        }
    }

    /// Resolved values in output column order (see [`RESOLVED_COLUMNS`], postal last)
    pub fn values(&self) -> [Option<&str>; 6] {
        [
            self.state.as_deref(),
            self.district.as_deref(),
            self.subdistrict.as_deref(),
            self.district_hq.as_deref(),
            self.state_capital.as_deref(),
            self.postal_code.as_deref(),
        ]
    }

    /// True when every resolved field is null
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }
}
