//! Pipeline entry point: builds every index once, then resolves the point
//! table in parallel.
//!
//! Stage order for one point: validation, hierarchy containment, facility
//! resolution (lookup or nearest), capital overrides, postal containment,
//! disputed masking. All shared state is read-only once [`Geocoder::build`]
//! returns.

use std::fmt;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{Config, FacilityStrategy};
use crate::error::{GeocodeError, Result};
use crate::io::{load_point_layer, load_polygon_layer, LayerLoader};
use crate::models::{LayerName, PointLayer, PointRecord, ResolvedRecord};
use crate::overlay::{DisputedMask, PostalOverlay};
use crate::pip::{Hierarchy, HierarchyResolver, NearestFacilityResolver, PlanarPoint};
use crate::projection::Projection;
use crate::reconcile::{containment_pairs, CapitalOverrides, NameLookup};

/// How one facility field is filled for a point
enum FacilitySource {
    /// Facility joined to its enclosing area, matched on the point's area name
    Lookup { area: LayerName, table: NameLookup },
    Nearest(NearestFacilityResolver),
}

impl FacilitySource {
    fn build(
        strategy: FacilityStrategy,
        facilities: PointLayer,
        area: LayerName,
        hierarchy: &HierarchyResolver,
        projection: &dyn Projection,
    ) -> Result<Self> {
        match strategy {
            FacilityStrategy::Lookup => {
                let areas = hierarchy.index(area).ok_or(GeocodeError::MissingLayer(area))?;
                let label = format!("{} lookup", facilities.name);
                let table = NameLookup::build(&label, containment_pairs(&facilities, areas));
                Ok(FacilitySource::Lookup { area, table })
            }
            FacilityStrategy::Nearest => Ok(FacilitySource::Nearest(
                NearestFacilityResolver::new(facilities, projection)?,
            )),
        }
    }

    /// Facility name and, for nearest search, its planar distance
    fn resolve(
        &self,
        hierarchy: &Hierarchy<'_>,
        planar: Option<PlanarPoint>,
    ) -> (Option<String>, Option<f64>) {
        match self {
            FacilitySource::Lookup { area, table } => {
                let name = hierarchy
                    .get(*area)
                    .and_then(|m| table.get(m.attribute))
                    .map(str::to_string);
                (name, None)
            }
            FacilitySource::Nearest(resolver) => match planar.and_then(|q| resolver.resolve(q)) {
                Some(facility) => (Some(facility.name.to_string()), Some(facility.distance)),
                None => (None, None),
            },
        }
    }

    fn is_nearest(&self) -> bool {
        matches!(self, FacilitySource::Nearest(_))
    }
}

/// The assembled pipeline
pub struct Geocoder {
    hierarchy: HierarchyResolver,
    capital: FacilitySource,
    hq: FacilitySource,
    overrides: CapitalOverrides,
    postal: PostalOverlay,
    disputed: DisputedMask,
}

impl Geocoder {
    /// Load every reference layer and build the indexes and lookup tables.
    ///
    /// Fails on any configuration error before a single point is resolved.
    pub fn build(config: &Config, loader: &dyn LayerLoader, projection: &dyn Projection) -> Result<Self> {
        config.validate()?;

        let state = load_polygon_layer(loader, config.layer(LayerName::State)?)?;
        let district = load_polygon_layer(loader, config.layer(LayerName::District)?)?;
        let subdistrict = load_polygon_layer(loader, config.layer(LayerName::Subdistrict)?)?;
        let capitals = load_point_layer(loader, config.layer(LayerName::StateCapital)?)?;
        let hqs = load_point_layer(loader, config.layer(LayerName::DistrictHq)?)?;
        let postal = load_polygon_layer(loader, config.layer(LayerName::Postal)?)?;

        info!("Building spatial indexes...");
        let hierarchy = HierarchyResolver::new(state, district, subdistrict);

        let capital = FacilitySource::build(
            config.capital_strategy,
            capitals,
            LayerName::State,
            &hierarchy,
            projection,
        )?;
        let hq = FacilitySource::build(
            config.hq_strategy,
            hqs,
            LayerName::District,
            &hierarchy,
            projection,
        )?;

        let overrides = CapitalOverrides::new(&config.capital_overrides);
        let postal = PostalOverlay::new(postal);
        let disputed = DisputedMask::new(&config.disputed.marker, &config.disputed.sentinel);

        info!(
            "Pipeline ready: {} postal polygons, {} capital overrides, capital by {:?}, HQ by {:?}",
            postal.index().len(),
            overrides.len(),
            config.capital_strategy,
            config.hq_strategy
        );

        Ok(Self {
            hierarchy,
            capital,
            hq,
            overrides,
            postal,
            disputed,
        })
    }

    /// True when any facility field is filled by nearest search
    pub fn needs_projection(&self) -> bool {
        self.capital.is_nearest() || self.hq.is_nearest()
    }

    /// Resolve a single point. `planar` is the point's projected location,
    /// required only for nearest-facility search.
    pub fn resolve_one(&self, point: &PointRecord, planar: Option<PlanarPoint>) -> ResolvedRecord {
        let Some(location) = point.location() else {
            return ResolvedRecord::unresolved(point.id, false);
        };

        let mut record = ResolvedRecord::unresolved(point.id, true);

        let hierarchy = self.hierarchy.lookup(&location);
        record.state = hierarchy.state.map(|m| m.attribute.to_string());
        record.district = hierarchy.district.map(|m| m.attribute.to_string());
        record.subdistrict = hierarchy.subdistrict.map(|m| m.attribute.to_string());
        record.ambiguous = hierarchy.ambiguous_levels();

        (record.district_hq, record.hq_distance) = self.hq.resolve(&hierarchy, planar);
        (record.state_capital, record.capital_distance) = self.capital.resolve(&hierarchy, planar);

        record.capital_overridden = self
            .overrides
            .apply(record.state.as_deref(), &mut record.state_capital);

        if let Some(postal) = self.postal.lookup(&location) {
            record.postal_code = Some(postal.attribute.to_string());
            if postal.ambiguous {
                record.ambiguous.push(LayerName::Postal);
            }
        }

        self.disputed.apply(&mut record);
        record
    }

    /// Resolve every point, preserving input order.
    ///
    /// Projection runs first, on the calling thread; resolution then runs on
    /// the rayon pool. `progress` is called once per resolved point. A valid
    /// point the projection cannot transform aborts the run before any point
    /// is resolved.
    pub fn resolve_all<F>(
        &self,
        points: &[PointRecord],
        projection: &dyn Projection,
        progress: F,
    ) -> Result<Resolution>
    where
        F: Fn(u64) + Sync,
    {
        let planar: Vec<Option<PlanarPoint>> = if self.needs_projection() {
            points
                .iter()
                .map(|point| match point.location() {
                    Some(location) => projection
                        .project(location.x(), location.y())
                        .map(Some)
                        .map_err(|e| match e {
                            GeocodeError::Projection(reason) => {
                                GeocodeError::Projection(format!("point {}: {}", point.id, reason))
                            }
                            other => other,
                        }),
                    None => Ok(None),
                })
                .collect::<Result<_>>()?
        } else {
            vec![None; points.len()]
        };

        info!("Resolving {} points...", points.len());
        let records: Vec<ResolvedRecord> = points
            .par_iter()
            .zip(planar.par_iter())
            .map(|(point, planar)| {
                let record = self.resolve_one(point, *planar);
                progress(1);
                record
            })
            .collect();

        let summary = RunSummary::from_records(&records);
        Ok(Resolution { records, summary })
    }
}

/// Output of a full run
#[derive(Debug, Clone)]
pub struct Resolution {
    /// One record per input point, in input order
    pub records: Vec<ResolvedRecord>,
    pub summary: RunSummary,
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    /// Points contained in more than one polygon, per layer
    pub ambiguous: Vec<(LayerName, usize)>,
    pub disputed: usize,
    pub overridden: usize,
}

impl RunSummary {
    pub fn from_records(records: &[ResolvedRecord]) -> Self {
        let valid = records.iter().filter(|r| r.valid).count();

        let ambiguous = LayerName::hierarchy()
            .iter()
            .copied()
            .chain(std::iter::once(LayerName::Postal))
            .map(|layer| {
                let count = records.iter().filter(|r| r.ambiguous.contains(&layer)).count();
                (layer, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        Self {
            total: records.len(),
            valid,
            invalid: records.len() - valid,
            ambiguous,
            disputed: records.iter().filter(|r| r.disputed).count(),
            overridden: records.iter().filter(|r| r.capital_overridden).count(),
        }
    }

    pub fn log(&self) {
        info!("{}", self);
        for (layer, count) in &self.ambiguous {
            warn!("{} points matched more than one '{}' polygon", count, layer);
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resolved {} points: {} valid, {} invalid, {} disputed, {} capital overrides",
            self.total, self.valid, self.invalid, self.disputed, self.overridden
        )
    }
}
