//! Planar projection collaborator.
//!
//! Nearest-facility ranking must happen in a locally distance-preserving
//! planar space, never in raw degrees. The pipeline only needs
//! `project(lon, lat) -> (x, y)`; the transformation math is delegated to
//! `proj4rs`.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{GeocodeError, Result};
use crate::pip::PlanarPoint;

/// Geographic source CRS (EPSG:4326)
pub const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// India-wide Lambert conformal conic (parameters of EPSG:7755), metres
pub const INDIA_LCC: &str = "+proj=lcc +lat_0=24 +lon_0=80 +lat_1=12.472955 +lat_2=35.1728044444444 \
     +x_0=4000000 +y_0=4000000 +datum=WGS84 +units=m +no_defs +type=crs";

/// Transform geographic coordinates (degrees) into a planar space.
pub trait Projection {
    fn project(&self, lon: f64, lat: f64) -> Result<PlanarPoint>;
}

/// Any plain function `(lon, lat) -> [x, y]` is a projection.
impl<F> Projection for F
where
    F: Fn(f64, f64) -> PlanarPoint,
{
    fn project(&self, lon: f64, lat: f64) -> Result<PlanarPoint> {
        Ok(self(lon, lat))
    }
}

/// Projection backed by a PROJ.4 definition string
pub struct Proj4Projection {
    from: Proj,
    to: Proj,
    definition: String,
}

impl Proj4Projection {
    /// Build a WGS84 → `definition` transformation.
    pub fn new(definition: &str) -> Result<Self> {
        let from = Proj::from_proj_string(WGS84)
            .map_err(|e| GeocodeError::Projection(format!("failed to build source PROJ.4: {e}")))?;
        let to = Proj::from_proj_string(definition).map_err(|e| {
            GeocodeError::Projection(format!("failed to build target PROJ.4 '{definition}': {e}"))
        })?;

        Ok(Self {
            from,
            to,
            definition: definition.to_string(),
        })
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }
}

impl Projection for Proj4Projection {
    fn project(&self, lon: f64, lat: f64) -> Result<PlanarPoint> {
        // Degrees → radians in, metres out
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| GeocodeError::Projection(format!("({lon}, {lat}): {e}")))?;
        Ok([point.0, point.1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::distance;

    #[test]
    fn test_closure_projection() {
        let scale = |lon: f64, lat: f64| [lon * 2.0, lat];
        assert_eq!(scale.project(1.0, 3.0).unwrap(), [2.0, 3.0]);
    }

    #[test]
    fn test_india_lcc_is_metric() {
        let proj = Proj4Projection::new(INDIA_LCC).unwrap();
        // Central meridian maps onto the false easting
        let origin = proj.project(80.0, 24.0).unwrap();
        assert!((origin[0] - 4_000_000.0).abs() < 1.0);
        assert!((origin[1] - 4_000_000.0).abs() < 1.0);

        // One degree of latitude is ~110.7 km on the ellipsoid; the secant
        // cone shrinks it between the standard parallels
        let north = proj.project(80.0, 25.0).unwrap();
        let d = distance(origin, north);
        assert!((105_000.0..112_000.0).contains(&d), "got {d}");
        assert!(d < 110_700.0, "got {d}");
    }

    #[test]
    fn test_degree_distance_is_anisotropic() {
        // At 30°N a degree of longitude is much shorter than a degree of latitude
        let proj = Proj4Projection::new(INDIA_LCC).unwrap();
        let here = proj.project(77.0, 30.0).unwrap();
        let east = proj.project(78.0, 30.0).unwrap();
        let north = proj.project(77.0, 31.0).unwrap();
        assert!(distance(here, east) < distance(here, north));
    }

    #[test]
    fn test_invalid_definition() {
        assert!(Proj4Projection::new("+proj=not_a_projection").is_err());
    }
}
