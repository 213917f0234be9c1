//! Tag filtering and geometry preparation.
//!
//! Selects features by key/value predicates, clips collections to a
//! bounding geometry, and explodes multi-geometries into single
//! geometries so the checks only ever see points, lines, and polygons.

use geo::{Geometry, Intersects};
use log::warn;

use crate::feature::{Feature, Properties, PropertyValue};

/// Values accepted by a [`TagFilter`].
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Any value passes, as long as the key is present and not one of the
    /// empty sentinels (`""`, `Null`, `"-1"`).
    Present,
    /// Exact text match against a single value.
    Equals(String),
    /// Membership in a list of values.
    OneOf(Vec<String>),
}

/// A key/value predicate over feature properties.
#[derive(Debug, Clone, PartialEq)]
pub struct TagFilter {
    /// Property key the filter inspects.
    pub key: String,
    /// Accepted values.
    pub value: FilterValue,
}

impl TagFilter {
    /// Filter passing any feature that carries `key` with a real value.
    pub fn present(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FilterValue::Present,
        }
    }

    /// Filter matching one exact value.
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FilterValue::Equals(value.into()),
        }
    }

    /// Filter matching any of the listed values.
    pub fn one_of(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            value: FilterValue::OneOf(values),
        }
    }

    /// Does a property map satisfy the filter?
    pub fn matches(&self, properties: &Properties) -> bool {
        let Some(value) = properties.get(&self.key) else {
            return false;
        };
        match &self.value {
            FilterValue::Present => !is_empty_sentinel(value),
            FilterValue::Equals(expected) => {
                value.as_text().is_some_and(|text| text == *expected)
            }
            FilterValue::OneOf(expected) => value
                .as_text()
                .is_some_and(|text| expected.contains(&text)),
        }
    }
}

/// The "no real value" sentinels used across OSM extracts.
fn is_empty_sentinel(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Null => true,
        PropertyValue::Text(text) => text.is_empty() || text == "-1",
        _ => false,
    }
}

/// Keep the features passing `filter` that touch the optional bounding
/// geometry.
///
/// Features whose geometry has no bounding box are dropped with a warning
/// when a bounds clip is requested.
pub fn filter_features(
    features: &[Feature],
    filter: &TagFilter,
    bounds: Option<&Geometry<f64>>,
) -> Vec<Feature> {
    features
        .iter()
        .filter(|feature| filter.matches(&feature.properties))
        .filter(|feature| match bounds {
            Some(region) => region.intersects(&feature.geometry),
            None => true,
        })
        .cloned()
        .collect()
}

/// Split a multi-geometry feature into one feature per member geometry.
///
/// Members receive a `geom_postfix` property (`_000`, `_001`, ...) so the
/// shared source id stays traceable. Zero-length line members are
/// dropped, as are warned-about unsupported collection members. Single
/// geometries pass through untouched.
pub fn explode(feature: &Feature) -> Vec<Feature> {
    let members: Vec<Geometry<f64>> = match &feature.geometry {
        Geometry::MultiPoint(points) => points.iter().map(|p| Geometry::Point(*p)).collect(),
        Geometry::MultiLineString(lines) => lines
            .iter()
            .filter(|line| line.lines().next().is_some())
            .map(|line| Geometry::LineString(line.clone()))
            .collect(),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .map(|polygon| Geometry::Polygon(polygon.clone()))
            .collect(),
        Geometry::GeometryCollection(collection) => {
            let mut members = Vec::with_capacity(collection.len());
            for member in collection {
                match member {
                    Geometry::Point(_) | Geometry::LineString(_) | Geometry::Polygon(_) => {
                        members.push(member.clone());
                    }
                    other => warn!("dropping nested {other:?} while exploding a collection"),
                }
            }
            members
        }
        _ => return vec![feature.clone()],
    };

    members
        .into_iter()
        .enumerate()
        .map(|(position, geometry)| {
            let mut member = Feature::new(geometry, feature.properties.clone());
            member.set("geom_postfix", format!("_{position:03}"));
            member
        })
        .collect()
}
