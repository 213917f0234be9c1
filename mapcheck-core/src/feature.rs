//! The atomic processing unit: a geometry plus a property map.
//!
//! Properties mirror the free-form key/value tag structure of
//! OpenStreetMap-style geodata. Values are a closed scalar variant;
//! a key that is missing from the map and a key holding
//! [`PropertyValue::Null`] are both treated as "absent".

use std::collections::HashMap;
use std::fmt;

use geo::Geometry;
use serde::{Deserialize, Serialize};

/// A scalar property value.
///
/// Variant order matters for deserialisation: integers must be tried
/// before reals so that JSON `3` stays an integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// No value. Stored explicitly so "checked but absent" survives
    /// serialisation.
    Null,
    /// A 64-bit integer.
    Integer(i64),
    /// A double-precision float.
    Real(f64),
    /// A free-form string.
    Text(String),
}

impl PropertyValue {
    /// True when the value is [`PropertyValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for `Null` and for the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Render the value as text, if present.
    ///
    /// Numbers are formatted with their natural `Display` output; `Null`
    /// yields `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(value) => Some(value.to_string()),
            Self::Real(value) => Some(value.to_string()),
            Self::Text(text) => Some(text.clone()),
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(""),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// Property map of a feature.
pub type Properties = HashMap<String, PropertyValue>;

/// A tagged vector map feature.
///
/// Coordinates are planar (projected); callers are responsible for
/// reprojecting before any check runs. No unique id is enforced, but an
/// `osm_id`-like key is assumed unique where features are paired in
/// reports.
///
/// # Examples
/// ```
/// use geo::{Geometry, Point};
/// use mapcheck_core::{Feature, Properties, PropertyValue};
///
/// let mut props = Properties::new();
/// props.insert("waterway".into(), "river".into());
/// let feature = Feature::new(Geometry::Point(Point::new(1.0, 2.0)), props);
/// assert_eq!(feature.get("waterway"), Some(&PropertyValue::Text("river".into())));
/// assert_eq!(feature.get("bridge"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Planar geometry of the feature.
    pub geometry: Geometry<f64>,
    /// Key/value tags.
    pub properties: Properties,
}

impl Feature {
    /// Construct a feature from a geometry and its properties.
    pub fn new(geometry: Geometry<f64>, properties: Properties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// Construct a feature without properties.
    pub fn with_empty_properties(geometry: Geometry<f64>) -> Self {
        Self::new(geometry, Properties::new())
    }

    /// Optional lookup of a property value.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Insert or replace a property.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Text rendering of a property, `None` when absent or `Null`.
    pub fn text_of(&self, key: &str) -> Option<String> {
        self.get(key).and_then(PropertyValue::as_text)
    }
}
