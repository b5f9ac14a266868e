use std::fs;
use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde_json::Value;
use tracing::{debug, warn};

use super::format_number;
use crate::config::LayerConfig;
use crate::error::{GeocodeError, Result};
use crate::models::{Feature, FeatureGeometry};

/// Read the features of a GeoJSON FeatureCollection.
///
/// Features with a null geometry or a null attribute are skipped.
pub fn read_features(path: &Path, config: &LayerConfig) -> Result<Vec<Feature>> {
    let bytes = fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    parse_feature_collection(&value, path, config)
}

fn parse_feature_collection(value: &Value, path: &Path, config: &LayerConfig) -> Result<Vec<Feature>> {
    let features = value["features"]
        .as_array()
        .ok_or_else(|| GeocodeError::UnsupportedLayer {
            path: path.to_path_buf(),
            reason: "not a GeoJSON FeatureCollection".to_string(),
        })?;

    let has_attribute = features
        .iter()
        .any(|f| f["properties"].get(&config.attribute).is_some());
    if !features.is_empty() && !has_attribute {
        return Err(GeocodeError::MissingAttribute {
            layer: config.name.to_string(),
            column: config.attribute.clone(),
        });
    }

    let mut result = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for (index, feature) in features.iter().enumerate() {
        let Some(attribute) = attribute_text(&feature["properties"][&config.attribute]) else {
            skipped += 1;
            continue;
        };

        match parse_geometry(&feature["geometry"]) {
            Some(geometry) => result.push(Feature {
                attribute,
                geometry,
            }),
            None => {
                debug!("Skipping feature {} of {}: no usable geometry", index, config.name);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(
            "Skipped {} features of layer '{}' with a null attribute or geometry",
            skipped, config.name
        );
    }

    Ok(result)
}

/// Attribute value as text; `None` for null or missing values.
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(format_number),
        },
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a GeoJSON geometry object into a feature geometry.
/// MultiPoint geometries resolve to their first point.
fn parse_geometry(geometry: &Value) -> Option<FeatureGeometry> {
    let coords = geometry["coordinates"].as_array()?;

    match geometry["type"].as_str()? {
        "Polygon" => Some(FeatureGeometry::Polygon(MultiPolygon::new(vec![
            parse_polygon(coords)?,
        ]))),
        "MultiPolygon" => {
            let polygons = coords
                .iter()
                .filter_map(|p| p.as_array().and_then(|rings| parse_polygon(rings)))
                .collect::<Vec<_>>();
            Some(FeatureGeometry::Polygon(MultiPolygon::new(polygons)))
        }
        "Point" => parse_position(&geometry["coordinates"])
            .map(|c| FeatureGeometry::Point(Point::from(c))),
        "MultiPoint" => coords
            .first()
            .and_then(parse_position)
            .map(|c| FeatureGeometry::Point(Point::from(c))),
        _ => None,
    }
}

/// First ring is the exterior, the rest are holes.
fn parse_polygon(rings: &[Value]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().filter_map(|r| r.as_array().map(|r| parse_ring(r)));
    let exterior = rings.next()?;
    let interiors = rings.collect();
    Some(Polygon::new(exterior, interiors))
}

fn parse_ring(coords: &[Value]) -> LineString<f64> {
    let mut points: Vec<Coord<f64>> = coords.iter().filter_map(parse_position).collect();

    // Ensure ring is closed (first point == last point)
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }

    LineString(points)
}

fn parse_position(position: &Value) -> Option<Coord<f64>> {
    let position = position.as_array()?;
    let x = position.first()?.as_f64()?;
    let y = position.get(1)?.as_f64()?;
    Some(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LayerName;
    use serde_json::json;
    use std::io::Write;

    fn postal_config() -> LayerConfig {
        LayerConfig::new(LayerName::Postal, "pincodes.geojson", "Pincode")
    }

    #[test]
    fn test_reads_polygons_and_numeric_codes() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "Pincode": 110001 },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[77.2, 28.6], [77.25, 28.6], [77.25, 28.65], [77.2, 28.65]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "Pincode": "110002" },
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]],
                            [[[5, 5], [6, 5], [6, 6], [5, 6], [5, 5]], [[5.2, 5.2], [5.4, 5.2], [5.4, 5.4], [5.2, 5.2]]]
                        ]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "Pincode": null },
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] }
                },
                {
                    "type": "Feature",
                    "properties": { "Pincode": "999999" },
                    "geometry": null
                }
            ]
        });

        let features = parse_feature_collection(&collection, Path::new("p.geojson"), &postal_config()).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].attribute, "110001");
        assert_eq!(features[1].attribute, "110002");

        let FeatureGeometry::Polygon(first) = &features[0].geometry else {
            panic!("expected polygon");
        };
        // Ring closed on read
        assert_eq!(first.0[0].exterior().0.len(), 5);

        let FeatureGeometry::Polygon(second) = &features[1].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(second.0.len(), 2);
        assert_eq!(second.0[1].interiors().len(), 1);
    }

    #[test]
    fn test_reads_points() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "HQ": "PUNE" },
                  "geometry": { "type": "Point", "coordinates": [73.85, 18.52] } },
                { "type": "Feature", "properties": { "HQ": "SATARA" },
                  "geometry": { "type": "MultiPoint", "coordinates": [[74.0, 17.68], [74.1, 17.7]] } }
            ]
        });
        let config = LayerConfig::new(LayerName::DistrictHq, "hq.geojson", "HQ");
        let features = parse_feature_collection(&collection, Path::new("hq.geojson"), &config).unwrap();
        assert_eq!(features[0], Feature::point("PUNE", 73.85, 18.52));
        assert_eq!(features[1], Feature::point("SATARA", 74.0, 17.68));
    }

    #[test]
    fn test_missing_attribute_column() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "PIN": 1 },
                  "geometry": { "type": "Point", "coordinates": [0, 0] } }
            ]
        });
        let err = parse_feature_collection(&collection, Path::new("p.geojson"), &postal_config()).unwrap_err();
        assert!(matches!(err, GeocodeError::MissingAttribute { .. }));
    }

    #[test]
    fn test_not_a_feature_collection() {
        let err = parse_feature_collection(&json!({ "type": "Point" }), Path::new("p.geojson"), &postal_config())
            .unwrap_err();
        assert!(matches!(err, GeocodeError::UnsupportedLayer { .. }));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{"Pincode":"560001"}},"geometry":{{"type":"Polygon","coordinates":[[[77.5,12.9],[77.7,12.9],[77.7,13.1],[77.5,12.9]]]}}}}]}}"#
        )
        .unwrap();
        let features = read_features(file.path(), &postal_config()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].attribute, "560001");
    }
}
