//! Name-keyed lookup tables built by containment joins between layers.

use hashbrown::hash_map::Entry;
use hashbrown::{HashMap, HashSet};
use tracing::{info, warn};

use super::normalize;
use crate::models::PointLayer;
use crate::pip::PolygonIndex;

/// Pair every facility with each area polygon containing it.
///
/// Returns `(area, facility)` in facility layer order, then area layer
/// order. A facility inside overlapping areas yields one pair per area;
/// facilities outside every area are dropped.
pub fn containment_pairs(facilities: &PointLayer, areas: &PolygonIndex) -> Vec<(String, String)> {
    facilities
        .features
        .iter()
        .flat_map(|facility| {
            areas
                .containing(&facility.location)
                .into_iter()
                .map(|id| (areas.attribute(id).to_string(), facility.attribute.clone()))
        })
        .collect()
}

/// Area name → facility name, keyed by normalized area name.
///
/// Identical `(area, facility)` pairs are dropped; when one normalized area
/// still maps to several facilities the first in input order is kept.
#[derive(Debug, Clone, Default)]
pub struct NameLookup {
    entries: HashMap<String, String>,
    conflicts: usize,
}

impl NameLookup {
    pub fn build(label: &str, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut entries: HashMap<String, String> = HashMap::new();
        let mut conflicts = 0;

        for (area, facility) in pairs {
            if !seen.insert((area.clone(), facility.clone())) {
                continue;
            }

            match entries.entry(normalize(&area)) {
                Entry::Occupied(existing) => {
                    if *existing.get() != facility {
                        warn!(
                            "{}: '{}' maps to both '{}' and '{}'; keeping '{}'",
                            label,
                            area,
                            existing.get(),
                            facility,
                            existing.get()
                        );
                        conflicts += 1;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(facility);
                }
            }
        }

        info!("Built {} lookup with {} entries", label, entries.len());

        Self { entries, conflicts }
    }

    /// Look up a facility by area name (normalized before matching)
    pub fn get(&self, area: &str) -> Option<&str> {
        self.entries.get(&normalize(area)).map(String::as_str)
    }

    /// Number of areas that had more than one distinct facility
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
