//! The data-model validator.
//!
//! Checks every feature's properties against a [`DataModel`] and stores a
//! per-key outcome flag next to the value (`<key><suffix>`). Flags are
//! data, never control flow:
//!
//! - no flag property: the key is not governed by the model;
//! - `Null` flag: a condition gate failed, the key was not applicable;
//! - `0`: valid; `1`: out of range; `2`: wrong type; `3`: missing/empty.
//!
//! The validator never mutates its input; it returns a new collection so
//! the same source features can be validated against several bounding
//! regions without interference.

use crate::feature::{Feature, Properties, PropertyValue};
use crate::model::{DataModel, Flag};

/// Switches and pass-through data for one validation run.
///
/// Constructed fresh per invocation; there is no shared default state.
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Emit the raw value instead of the coerced one.
    pub keep_original: bool,
    /// Suffix of the flag property name.
    pub flag_suffix: String,
    /// Constants stamped on every output feature (e.g. the name of the
    /// bounding region the batch was clipped to).
    pub global_props: Properties,
    /// Keys copied from the input feature without any check.
    pub pass_through: Vec<String>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            keep_original: false,
            flag_suffix: "_flag".to_owned(),
            global_props: Properties::new(),
            pass_through: Vec::new(),
        }
    }
}

/// Validate a feature collection against a data model.
///
/// Returns a new collection; per-key outcomes are encoded as flag
/// properties as described in the module docs. The model itself is
/// validated at construction, so this transform cannot fail.
pub fn check_data_model(
    features: &[Feature],
    model: &DataModel,
    options: &ValidateOptions,
) -> Vec<Feature> {
    features
        .iter()
        .map(|feature| check_feature(feature, model, options))
        .collect()
}

fn check_feature(feature: &Feature, model: &DataModel, options: &ValidateOptions) -> Feature {
    let mut properties = options.global_props.clone();
    for key in &options.pass_through {
        let value = feature.get(key).cloned().unwrap_or(PropertyValue::Null);
        properties.insert(key.clone(), value);
    }

    // Ungoverned keys are copied through untouched and unflagged.
    for (key, value) in &feature.properties {
        if !model.governs(key) {
            properties.insert(key.clone(), value.clone());
        }
    }

    for key in model.governed_keys() {
        let flag_key = format!("{key}{}", options.flag_suffix);
        let raw = feature.get(key).cloned().unwrap_or(PropertyValue::Null);

        if let Some(gate) = model.conditions.get(key)
            && !gate.evaluate(&feature.properties)
        {
            // Not applicable: the raw value passes through, the flag stays
            // explicitly empty.
            properties.insert(key.to_owned(), raw);
            properties.insert(flag_key, PropertyValue::Null);
            continue;
        }

        let (checked, flag) = flag_value(model, key, &raw);
        let output = if options.keep_original { raw } else { checked };
        properties.insert(key.to_owned(), output);
        properties.insert(flag_key, PropertyValue::Integer(flag.code()));
    }

    Feature::new(feature.geometry.clone(), properties)
}

/// Check one governed key and return the coerced value plus its flag.
fn flag_value(model: &DataModel, key: &str, raw: &PropertyValue) -> (PropertyValue, Flag) {
    let range = model.ranges.get(key);

    if let Some(field_type) = model.types.get(key).copied()
        && !raw.is_null()
    {
        // An empty string never satisfies a type rule, even the text one.
        if raw.is_empty() {
            return (PropertyValue::Null, Flag::Missing);
        }
        return match field_type.coerce(raw) {
            Some(coerced) => {
                let flag = match range {
                    Some(rule) if !rule.contains(&coerced) => Flag::OutOfRange,
                    _ => Flag::Valid,
                };
                (coerced, flag)
            }
            None => (PropertyValue::Null, Flag::WrongType),
        };
    }

    // Range-only path (or a typed key with no value at all). Text is
    // lower-cased before the membership test.
    let checked = match raw {
        PropertyValue::Text(text) => PropertyValue::Text(text.to_lowercase()),
        other => other.clone(),
    };
    let mut flag = match range {
        Some(rule) if !rule.contains(&checked) => Flag::OutOfRange,
        _ => Flag::Valid,
    };
    if checked.is_null() {
        flag = Flag::Missing;
    }
    (checked, flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Combinator, ConditionRule, FieldType, RangeRule};
    use geo::{Geometry, Point};
    use rstest::{fixture, rstest};

    fn feature_with(props: &[(&str, PropertyValue)]) -> Feature {
        let mut feature = Feature::with_empty_properties(Geometry::Point(Point::new(0.0, 0.0)));
        for (key, value) in props {
            feature.set(*key, value.clone());
        }
        feature
    }

    #[fixture]
    fn model() -> DataModel {
        let mut model = DataModel::default();
        model.types.insert("width".into(), FieldType::Real);
        model
            .ranges
            .insert("width".into(), RangeRule::bounds("width", &[0.5, 30.0]).unwrap());
        model
            .ranges
            .insert("waterway".into(), RangeRule::allow_list(vec!["river".into(), "stream".into()]));
        model
    }

    fn flag_of(feature: &Feature, key: &str) -> PropertyValue {
        feature.get(&format!("{key}_flag")).cloned().unwrap_or(PropertyValue::Null)
    }

    #[rstest]
    fn ungoverned_key_gets_no_flag(model: DataModel) {
        let input = vec![feature_with(&[("name", "Rhine".into())])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(checked[0].get("name"), Some(&"Rhine".into()));
        assert!(checked[0].get("name_flag").is_none());
    }

    #[rstest]
    #[case("4.2".into(), 0)]
    #[case(PropertyValue::Real(45.0), 1)]
    #[case("wide".into(), 2)]
    #[case("".into(), 3)]
    fn typed_key_flags(model: DataModel, #[case] value: PropertyValue, #[case] code: i64) {
        let input = vec![feature_with(&[("width", value)])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(flag_of(&checked[0], "width"), PropertyValue::Integer(code));
    }

    #[rstest]
    fn empty_text_typed_value_is_flagged_missing(mut model: DataModel) {
        model.types.insert("name".into(), FieldType::Text);
        let input = vec![feature_with(&[("name", "".into())])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(flag_of(&checked[0], "name"), PropertyValue::Integer(3));
        assert_eq!(checked[0].get("name"), Some(&PropertyValue::Null));
    }

    #[rstest]
    fn typed_key_missing_entirely_flags_missing(model: DataModel) {
        let input = vec![feature_with(&[])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(flag_of(&checked[0], "width"), PropertyValue::Integer(3));
    }

    #[rstest]
    #[case("River".into(), 0)]
    #[case("canal".into(), 1)]
    #[case(PropertyValue::Null, 3)]
    fn range_only_key_flags(model: DataModel, #[case] value: PropertyValue, #[case] code: i64) {
        let input = vec![feature_with(&[("waterway", value)])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(flag_of(&checked[0], "waterway"), PropertyValue::Integer(code));
    }

    #[rstest]
    fn coerced_value_replaces_raw_by_default(model: DataModel) {
        let input = vec![feature_with(&[("width", "4.2".into())])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(checked[0].get("width"), Some(&PropertyValue::Real(4.2)));
    }

    #[rstest]
    fn keep_original_preserves_raw_value(model: DataModel) {
        let options = ValidateOptions {
            keep_original: true,
            ..ValidateOptions::default()
        };
        let input = vec![feature_with(&[("width", "4.2".into())])];
        let checked = check_data_model(&input, &model, &options);
        assert_eq!(checked[0].get("width"), Some(&"4.2".into()));
        assert_eq!(flag_of(&checked[0], "width"), PropertyValue::Integer(0));
    }

    #[rstest]
    fn failed_gate_marks_key_not_applicable(mut model: DataModel) {
        model.conditions.insert(
            "width".into(),
            ConditionRule {
                combinator: Combinator::All,
                terms: vec![("waterway".into(), "river".into())],
            },
        );
        let input = vec![feature_with(&[
            ("waterway", "ditch".into()),
            ("width", "oops".into()),
        ])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        // Raw value passes through unchanged; the flag is explicitly empty.
        assert_eq!(checked[0].get("width"), Some(&"oops".into()));
        assert_eq!(checked[0].get("width_flag"), Some(&PropertyValue::Null));
    }

    #[rstest]
    fn passing_gate_checks_normally(mut model: DataModel) {
        model.conditions.insert(
            "width".into(),
            ConditionRule {
                combinator: Combinator::Any,
                terms: vec![("waterway".into(), "river".into())],
            },
        );
        let input = vec![feature_with(&[
            ("waterway", "river".into()),
            ("width", "4.2".into()),
        ])];
        let checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(flag_of(&checked[0], "width"), PropertyValue::Integer(0));
    }

    #[rstest]
    fn global_and_pass_through_props_are_stamped(model: DataModel) {
        let mut global_props = Properties::new();
        global_props.insert("name_bound".into(), "basin_west".into());
        let options = ValidateOptions {
            global_props,
            pass_through: vec!["osm_id".into()],
            ..ValidateOptions::default()
        };
        let input = vec![feature_with(&[("osm_id", "w1".into())])];
        let checked = check_data_model(&input, &model, &options);
        assert_eq!(checked[0].get("name_bound"), Some(&"basin_west".into()));
        assert_eq!(checked[0].get("osm_id"), Some(&"w1".into()));
    }

    #[rstest]
    fn input_collection_is_untouched(model: DataModel) {
        let input = vec![feature_with(&[("width", "4.2".into())])];
        let before = input.clone();
        let _checked = check_data_model(&input, &model, &ValidateOptions::default());
        assert_eq!(input, before);
    }
}
