use std::path::Path;

use ::shapefile::dbase::{FieldValue, Record};
use ::shapefile::{PolygonRing, Reader, Shape};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use tracing::warn;

use super::format_number;
use crate::config::LayerConfig;
use crate::error::{GeocodeError, Result};
use crate::models::{Feature, FeatureGeometry};

/// Read every shape and its attribute from a `.shp` file (with its `.dbf`).
///
/// Null shapes and records with an empty attribute are skipped.
pub fn read_features(path: &Path, config: &LayerConfig) -> Result<Vec<Feature>> {
    let dbf_path = path.with_extension("dbf");
    let table = ::shapefile::dbase::Reader::from_path(&dbf_path).map_err(|e| {
        GeocodeError::UnsupportedLayer {
            path: dbf_path.clone(),
            reason: e.to_string(),
        }
    })?;
    require_column(table.fields().iter().map(|f| f.name()), config)?;

    let mut reader = Reader::from_path(path)?;

    let mut features = Vec::with_capacity(reader.shape_count()?);
    let mut skipped = 0usize;

    for (index, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result?;

        let Some(attribute) = attribute_text(&record, &config.attribute) else {
            skipped += 1;
            continue;
        };

        let geometry = match shape_geometry(shape) {
            Ok(Some(geometry)) => geometry,
            Ok(None) => {
                skipped += 1;
                continue;
            }
            Err(shape_type) => {
                return Err(GeocodeError::UnsupportedLayer {
                    path: path.to_path_buf(),
                    reason: format!("shape {index} is a {shape_type}"),
                })
            }
        };

        features.push(Feature {
            attribute,
            geometry,
        });
    }

    if skipped > 0 {
        warn!(
            "Skipped {} records of layer '{}' with a null shape or attribute",
            skipped, config.name
        );
    }

    Ok(features)
}

/// Fail unless the table declares the configured attribute column.
fn require_column<'a>(mut fields: impl Iterator<Item = &'a str>, config: &LayerConfig) -> Result<()> {
    if fields.any(|name| name == config.attribute) {
        Ok(())
    } else {
        Err(GeocodeError::MissingAttribute {
            layer: config.name.to_string(),
            column: config.attribute.clone(),
        })
    }
}

/// Attribute value as text; `None` for null values.
fn attribute_text(record: &Record, column: &str) -> Option<String> {
    match record.get(column)? {
        FieldValue::Character(Some(s)) | FieldValue::Memo(s) => {
            let s = s.trim_end();
            (!s.is_empty()).then(|| s.to_string())
        }
        FieldValue::Numeric(Some(n)) => Some(format_number(*n)),
        FieldValue::Float(Some(n)) => Some(format_number(f64::from(*n))),
        FieldValue::Double(n) | FieldValue::Currency(n) => Some(format_number(*n)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Logical(Some(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert a shape into a feature geometry.
///
/// `Ok(None)` for null shapes, `Err` with the shape type for shapes that are
/// neither polygonal nor point-like.
fn shape_geometry(shape: Shape) -> std::result::Result<Option<FeatureGeometry>, String> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => point(p.x, p.y),
        Shape::PointM(p) => point(p.x, p.y),
        Shape::PointZ(p) => point(p.x, p.y),
        Shape::Multipoint(mp) => match mp.points().first() {
            Some(p) => point(p.x, p.y),
            None => return Ok(None),
        },
        Shape::MultipointM(mp) => match mp.points().first() {
            Some(p) => point(p.x, p.y),
            None => return Ok(None),
        },
        Shape::MultipointZ(mp) => match mp.points().first() {
            Some(p) => point(p.x, p.y),
            None => return Ok(None),
        },
        Shape::Polygon(p) => polygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::PolygonM(p) => polygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        Shape::PolygonZ(p) => polygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
        other => return Err(format!("{:?}", other.shapetype())),
    };
    Ok(Some(geometry))
}

fn point(x: f64, y: f64) -> FeatureGeometry {
    FeatureGeometry::Point(Point::new(x, y))
}

/// Group shapefile rings into polygons: each outer ring takes the inner
/// rings that follow it.
fn polygon<P>(rings: &[PolygonRing<P>], coord: impl Fn(&P) -> Coord<f64>) -> FeatureGeometry {
    fn closed(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0]);
        }
        LineString(coords)
    }

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let coords = closed(ring.points().iter().map(&coord).collect());
        match ring {
            PolygonRing::Outer(_) => {
                // flush previous polygon
                if let Some(ext) = current_exterior.take() {
                    polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
                }
                current_exterior = Some(coords);
            }
            PolygonRing::Inner(_) => current_holes.push(coords),
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    FeatureGeometry::Polygon(MultiPolygon::new(polys))
}
