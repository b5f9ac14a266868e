//! Lookup reconciliation: normalized name joins and the capital override table.

mod lookup;
mod normalize;
mod overrides;

pub use lookup::{containment_pairs, NameLookup};
pub use normalize::normalize;
pub use overrides::CapitalOverrides;
