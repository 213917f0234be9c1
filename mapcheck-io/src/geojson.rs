//! Serde-based GeoJSON codec for feature collections.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use log::debug;
use mapcheck_core::{Feature, Properties, PropertyValue};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Errors raised while reading or writing a GeoJSON document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GeoJsonError {
    /// The file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The document is not a feature collection.
    #[error("expected a FeatureCollection, found {found:?}")]
    NotACollection {
        /// `type` member actually present.
        found: String,
    },
    /// A required member is missing from a feature.
    #[error("feature {index} is missing its {field:?} member")]
    MissingField {
        /// Position of the feature in the collection.
        index: usize,
        /// Name of the missing member.
        field: &'static str,
    },
    /// A geometry type outside the supported subset.
    #[error("unsupported geometry type {kind:?}")]
    UnsupportedGeometry {
        /// GeoJSON `type` of the geometry.
        kind: String,
    },
    /// Coordinates that do not match their geometry type.
    #[error("malformed coordinates: {detail}")]
    MalformedCoordinates {
        /// What was wrong.
        detail: String,
    },
    /// A property value outside the scalar subset.
    #[error("property {key:?} holds a non-scalar value")]
    UnsupportedProperty {
        /// Offending property key.
        key: String,
    },
}

/// Read a feature collection from a GeoJSON file.
pub fn read_collection(path: impl AsRef<Path>) -> Result<Vec<Feature>, GeoJsonError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| GeoJsonError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let kind = document
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if kind != "FeatureCollection" {
        return Err(GeoJsonError::NotACollection {
            found: kind.to_owned(),
        });
    }
    let members = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or(GeoJsonError::NotACollection {
            found: "FeatureCollection without features".to_owned(),
        })?;

    let mut features = Vec::with_capacity(members.len());
    for (index, member) in members.iter().enumerate() {
        let geometry = member
            .get("geometry")
            .filter(|value| !value.is_null())
            .ok_or(GeoJsonError::MissingField {
                index,
                field: "geometry",
            })?;
        let properties = match member.get("properties") {
            Some(Value::Object(map)) => decode_properties(map)?,
            _ => Properties::new(),
        };
        features.push(Feature::new(decode_geometry(geometry)?, properties));
    }
    debug!("read {} feature(s) from {}", features.len(), path.display());
    Ok(features)
}

/// Write a feature collection to a GeoJSON file.
pub fn write_collection(
    path: impl AsRef<Path>,
    features: &[Feature],
) -> Result<(), GeoJsonError> {
    let path = path.as_ref();
    let members = features
        .iter()
        .map(|feature| {
            Ok(json!({
                "type": "Feature",
                "geometry": encode_geometry(&feature.geometry)?,
                "properties": encode_properties(&feature.properties),
            }))
        })
        .collect::<Result<Vec<Value>, GeoJsonError>>()?;
    let document = json!({
        "type": "FeatureCollection",
        "features": members,
    });
    let rendered = format!("{document:#}");
    fs::write(path, rendered).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("wrote {} feature(s) to {}", features.len(), path.display());
    Ok(())
}

fn decode_properties(map: &Map<String, Value>) -> Result<Properties, GeoJsonError> {
    let mut properties = Properties::with_capacity(map.len());
    for (key, value) in map {
        let decoded = match value {
            Value::Null => PropertyValue::Null,
            // Original extracts store booleans as 0/1 integers.
            Value::Bool(flag) => PropertyValue::Integer(i64::from(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(PropertyValue::Integer)
                .or_else(|| number.as_f64().map(PropertyValue::Real))
                .ok_or_else(|| GeoJsonError::UnsupportedProperty { key: key.clone() })?,
            Value::String(text) => PropertyValue::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => {
                return Err(GeoJsonError::UnsupportedProperty { key: key.clone() });
            }
        };
        properties.insert(key.clone(), decoded);
    }
    Ok(properties)
}

fn encode_properties(properties: &Properties) -> Value {
    let mut map = Map::with_capacity(properties.len());
    for (key, value) in properties {
        let encoded = match value {
            PropertyValue::Null => Value::Null,
            PropertyValue::Integer(number) => json!(number),
            PropertyValue::Real(number) => json!(number),
            PropertyValue::Text(text) => json!(text),
        };
        map.insert(key.clone(), encoded);
    }
    Value::Object(map)
}

fn decode_geometry(value: &Value) -> Result<Geometry<f64>, GeoJsonError> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let coordinates = value
        .get("coordinates")
        .ok_or(GeoJsonError::MalformedCoordinates {
            detail: "geometry without coordinates".to_owned(),
        })?;
    match kind {
        "Point" => Ok(Geometry::Point(Point::from(decode_coord(coordinates)?))),
        "LineString" => Ok(Geometry::LineString(decode_line(coordinates)?)),
        "Polygon" => Ok(Geometry::Polygon(decode_polygon(coordinates)?)),
        "MultiPoint" => {
            let points = decode_positions(coordinates)?
                .into_iter()
                .map(Point::from)
                .collect();
            Ok(Geometry::MultiPoint(MultiPoint::new(points)))
        }
        "MultiLineString" => {
            let lines = array_of(coordinates)?
                .iter()
                .map(decode_line)
                .collect::<Result<Vec<LineString<f64>>, GeoJsonError>>()?;
            Ok(Geometry::MultiLineString(MultiLineString::new(lines)))
        }
        "MultiPolygon" => {
            let polygons = array_of(coordinates)?
                .iter()
                .map(decode_polygon)
                .collect::<Result<Vec<Polygon<f64>>, GeoJsonError>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(GeoJsonError::UnsupportedGeometry {
            kind: other.to_owned(),
        }),
    }
}

fn array_of(value: &Value) -> Result<&Vec<Value>, GeoJsonError> {
    value.as_array().ok_or(GeoJsonError::MalformedCoordinates {
        detail: "expected an array".to_owned(),
    })
}

fn decode_coord(value: &Value) -> Result<Coord<f64>, GeoJsonError> {
    let pair = array_of(value)?;
    let mut axes = pair.iter().filter_map(Value::as_f64);
    match (axes.next(), axes.next()) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(GeoJsonError::MalformedCoordinates {
            detail: format!("expected a position, found {value}"),
        }),
    }
}

fn decode_positions(value: &Value) -> Result<Vec<Coord<f64>>, GeoJsonError> {
    array_of(value)?.iter().map(decode_coord).collect()
}

fn decode_line(value: &Value) -> Result<LineString<f64>, GeoJsonError> {
    Ok(LineString::from(decode_positions(value)?))
}

fn decode_polygon(value: &Value) -> Result<Polygon<f64>, GeoJsonError> {
    let mut rings = array_of(value)?
        .iter()
        .map(decode_line)
        .collect::<Result<Vec<LineString<f64>>, GeoJsonError>>()?;
    if rings.is_empty() {
        return Err(GeoJsonError::MalformedCoordinates {
            detail: "polygon without rings".to_owned(),
        });
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn encode_geometry(geometry: &Geometry<f64>) -> Result<Value, GeoJsonError> {
    let encoded = match geometry {
        Geometry::Point(point) => json!({
            "type": "Point",
            "coordinates": encode_coord(point.0),
        }),
        Geometry::LineString(line) => json!({
            "type": "LineString",
            "coordinates": encode_line(line),
        }),
        Geometry::Polygon(polygon) => json!({
            "type": "Polygon",
            "coordinates": encode_polygon(polygon),
        }),
        Geometry::MultiPoint(points) => json!({
            "type": "MultiPoint",
            "coordinates": points.iter().map(|point| encode_coord(point.0)).collect::<Vec<Value>>(),
        }),
        Geometry::MultiLineString(lines) => json!({
            "type": "MultiLineString",
            "coordinates": lines.iter().map(encode_line).collect::<Vec<Value>>(),
        }),
        Geometry::MultiPolygon(polygons) => json!({
            "type": "MultiPolygon",
            "coordinates": polygons.iter().map(encode_polygon).collect::<Vec<Value>>(),
        }),
        other => {
            return Err(GeoJsonError::UnsupportedGeometry {
                kind: format!("{other:?}"),
            });
        }
    };
    Ok(encoded)
}

fn encode_coord(coord: Coord<f64>) -> Value {
    json!([coord.x, coord.y])
}

fn encode_line(line: &LineString<f64>) -> Value {
    Value::Array(line.coords().map(|coord| encode_coord(*coord)).collect())
}

fn encode_polygon(polygon: &Polygon<f64>) -> Value {
    let mut rings = vec![encode_line(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(encode_line));
    Value::Array(rings)
}
