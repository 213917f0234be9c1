//! The declarative data model features are validated against.
//!
//! A model has three independent rule maps:
//! - `types`: key -> expected scalar type, with a coercion per type;
//! - `ranges`: key -> numeric bounds or an allow-list of values;
//! - `conditions`: key -> a gate deciding whether the key is checked at
//!   all for a given feature.
//!
//! Models are validated when built from a [`DataModelSpec`]; a malformed
//! numeric range aborts before any feature is processed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::feature::{Properties, PropertyValue};

/// Outcome code for one property's validation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// The value is present, well-typed, and within range.
    Valid,
    /// The value is type-valid but outside the range or allow-list.
    OutOfRange,
    /// The value is present but of the wrong type.
    WrongType,
    /// The value is missing or empty.
    Missing,
}

impl Flag {
    /// Numeric code stored in the flag property (0-3).
    pub fn code(self) -> i64 {
        match self {
            Self::Valid => 0,
            Self::OutOfRange => 1,
            Self::WrongType => 2,
            Self::Missing => 3,
        }
    }
}

/// Expected scalar type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free-form text; coercion lower-cases for comparison.
    Text,
    /// 64-bit integer.
    Integer,
    /// Double-precision float.
    Real,
}

impl FieldType {
    /// Try to coerce a raw value to this type.
    ///
    /// Returns `None` when the value does not parse; callers distinguish
    /// "empty" from "malformed" themselves. This is a tagged result, never
    /// caught-exception control flow.
    pub fn coerce(self, value: &PropertyValue) -> Option<PropertyValue> {
        match (self, value) {
            (_, PropertyValue::Null) => None,
            (Self::Text, value) => value
                .as_text()
                .map(|text| PropertyValue::Text(text.to_lowercase())),
            (Self::Integer, PropertyValue::Integer(n)) => Some(PropertyValue::Integer(*n)),
            // Truncation mirrors numeric narrowing in loosely typed sources.
            (Self::Integer, PropertyValue::Real(x)) => Some(PropertyValue::Integer(*x as i64)),
            (Self::Integer, PropertyValue::Text(text)) => {
                text.trim().parse::<i64>().ok().map(PropertyValue::Integer)
            }
            (Self::Real, PropertyValue::Integer(n)) => Some(PropertyValue::Real(*n as f64)),
            (Self::Real, PropertyValue::Real(x)) => Some(PropertyValue::Real(*x)),
            (Self::Real, PropertyValue::Text(text)) => {
                text.trim().parse::<f64>().ok().map(PropertyValue::Real)
            }
        }
    }
}

/// Allowed values for a property.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeRule {
    /// Inclusive numeric interval.
    Bounds {
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },
    /// Explicit allow-list; an empty list accepts everything.
    AllowList(Vec<PropertyValue>),
}

impl RangeRule {
    /// Build a numeric range from a 2-element bound list.
    ///
    /// Bound order does not matter. Any other arity is a configuration
    /// error reported against `key`.
    pub fn bounds(key: &str, values: &[f64]) -> Result<Self, ModelError> {
        match values {
            [a, b] => Ok(Self::Bounds {
                lo: a.min(*b),
                hi: a.max(*b),
            }),
            _ => Err(ModelError::InvalidNumericRange {
                key: key.to_owned(),
                count: values.len(),
            }),
        }
    }

    /// Build an allow-list; text entries are lower-cased once here so
    /// membership tests stay case-insensitive.
    pub fn allow_list(values: impl IntoIterator<Item = PropertyValue>) -> Self {
        Self::AllowList(
            values
                .into_iter()
                .map(|value| match value {
                    PropertyValue::Text(text) => PropertyValue::Text(text.to_lowercase()),
                    other => other,
                })
                .collect(),
        )
    }

    /// Membership test for a (coerced) value.
    pub fn contains(&self, value: &PropertyValue) -> bool {
        match self {
            Self::Bounds { lo, hi } => value
                .as_f64()
                .is_some_and(|number| *lo <= number && number <= *hi),
            Self::AllowList(allowed) => {
                allowed.is_empty() || allowed.iter().any(|entry| values_match(entry, value))
            }
        }
    }
}

/// Equality across the scalar variants: numbers compare numerically, text
/// compares case-insensitively.
fn values_match(a: &PropertyValue, b: &PropertyValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (PropertyValue::Text(x), PropertyValue::Text(y)) => *x == y.to_lowercase(),
            _ => a == b,
        },
    }
}

/// How condition terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Every term must hold.
    All,
    /// At least one term must hold.
    Any,
}

/// Gate deciding whether a key is checked at all for a feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRule {
    /// Term combinator.
    pub combinator: Combinator,
    /// `(other_key, required_value)` equality terms, evaluated against the
    /// feature's own properties. An absent key fails its term.
    pub terms: Vec<(String, PropertyValue)>,
}

impl ConditionRule {
    /// Evaluate the gate against a property map.
    pub fn evaluate(&self, properties: &Properties) -> bool {
        let mut term_results = self
            .terms
            .iter()
            .map(|(key, required)| properties.get(key).is_some_and(|value| value == required));
        match self.combinator {
            Combinator::All => term_results.all(|held| held),
            Combinator::Any => term_results.any(|held| held),
        }
    }
}

/// The full declarative data model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataModel {
    /// Expected type per key.
    pub types: HashMap<String, FieldType>,
    /// Allowed values per key.
    pub ranges: HashMap<String, RangeRule>,
    /// Check gates per key.
    pub conditions: HashMap<String, ConditionRule>,
}

impl DataModel {
    /// Build and validate a model from its on-disk specification.
    ///
    /// # Errors
    /// Returns [`ModelError`] when a numeric range does not have exactly
    /// two bounds.
    pub fn from_spec(spec: DataModelSpec) -> Result<Self, ModelError> {
        let mut ranges = HashMap::with_capacity(spec.ranges.len());
        for (key, range) in spec.ranges {
            let rule = match range {
                RangeSpec::Numeric(bounds) => RangeRule::bounds(&key, &bounds)?,
                RangeSpec::Categorical { allow } => RangeRule::allow_list(allow),
            };
            ranges.insert(key, rule);
        }
        let conditions = spec
            .conditions
            .into_iter()
            .map(|(key, condition)| {
                let rule = match condition {
                    ConditionSpec::All(terms) => ConditionRule {
                        combinator: Combinator::All,
                        terms,
                    },
                    ConditionSpec::Any(terms) => ConditionRule {
                        combinator: Combinator::Any,
                        terms,
                    },
                };
                (key, rule)
            })
            .collect();
        Ok(Self {
            types: spec.types,
            ranges,
            conditions,
        })
    }

    /// True when the key carries a type rule or a range rule.
    pub fn governs(&self, key: &str) -> bool {
        self.types.contains_key(key) || self.ranges.contains_key(key)
    }

    /// Governed keys in sorted order.
    pub fn governed_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .types
            .keys()
            .chain(self.ranges.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// Serialisable form of a [`DataModel`], as read from the rules file.
///
/// ```json
/// {
///   "types": {"width": "real", "name": "text"},
///   "ranges": {"width": [0.5, 30.0], "waterway": {"allow": ["river"]}},
///   "conditions": {"width": {"all": [["waterway", "river"]]}}
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataModelSpec {
    /// Expected type per key.
    #[serde(default)]
    pub types: HashMap<String, FieldType>,
    /// Range or allow-list per key.
    #[serde(default)]
    pub ranges: HashMap<String, RangeSpec>,
    /// Check gate per key.
    #[serde(default)]
    pub conditions: HashMap<String, ConditionSpec>,
}

/// Raw range specification: a numeric bound pair or an allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    /// `[min, max]` (order-independent; arity is validated).
    Numeric(Vec<f64>),
    /// `{"allow": [...]}` categorical values.
    Categorical {
        /// Accepted values; empty accepts everything.
        allow: Vec<PropertyValue>,
    },
}

/// Raw condition specification keyed by combinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionSpec {
    /// Every `[key, value]` pair must match.
    All(Vec<(String, PropertyValue)>),
    /// At least one `[key, value]` pair must match.
    Any(Vec<(String, PropertyValue)>),
}
