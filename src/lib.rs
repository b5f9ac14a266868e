//! Sarvekshan - offline batch reverse geocoder for Indian administrative data
//!
//! Resolves each point of a table to its state, district and sub-district by
//! polygon containment, attaches the district headquarters and state capital,
//! the enclosing PIN code, and masks disputed territory. The `geocode`
//! binary drives the pipeline from a CSV file.

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod overlay;
pub mod pip;
pub mod pipeline;
pub mod projection;
pub mod reconcile;
pub mod report;

pub use config::{Config, FacilityStrategy};
pub use error::{GeocodeError, Result};
pub use models::{LayerName, PointRecord, ResolvedRecord};
pub use pipeline::{Geocoder, Resolution, RunSummary};
