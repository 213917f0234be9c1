//! Summary tallies written next to the checked collections.
//!
//! These are the per-region report rows of the original validation
//! workflow: flag distributions per governed key after a data-model run,
//! and structure counts after a crossing run. Both serialise to JSON for
//! the report writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feature::{Feature, PropertyValue};
use crate::model::DataModel;

/// Flag distribution for one governed key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCounts {
    /// Flag 0: value valid.
    pub correct: usize,
    /// Flag 1: value of the right type but outside its range.
    pub invalid_value: usize,
    /// Flag 2: value of the wrong data type.
    pub invalid_data_type: usize,
    /// Flag 3: value missing or empty.
    pub missing_value: usize,
}

impl FlagCounts {
    fn count(&mut self, code: i64) {
        match code {
            0 => self.correct += 1,
            1 => self.invalid_value += 1,
            2 => self.invalid_data_type += 1,
            3 => self.missing_value += 1,
            _ => {}
        }
    }
}

/// Flag distributions over a checked collection, keyed by governed key.
///
/// Not-applicable outcomes (`Null` flags from failed condition gates) are
/// not counted; they carry no quality signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Per-key flag counts, sorted by key.
    pub keys: BTreeMap<String, FlagCounts>,
}

impl ValidationSummary {
    /// Tally flag properties across a checked collection.
    ///
    /// `flag_suffix` must match the suffix the validator ran with.
    pub fn tally(features: &[Feature], model: &DataModel, flag_suffix: &str) -> Self {
        let mut keys: BTreeMap<String, FlagCounts> = model
            .governed_keys()
            .into_iter()
            .map(|key| (key.to_owned(), FlagCounts::default()))
            .collect();
        for feature in features {
            for (key, counts) in &mut keys {
                let flag_key = format!("{key}{flag_suffix}");
                if let Some(PropertyValue::Integer(code)) = feature.get(&flag_key) {
                    counts.count(*code);
                }
            }
        }
        Self { keys }
    }
}

/// Tallies over one crossing detection run.
///
/// Counted per pair that resolved to at least one crossing vertex, not
/// per emitted vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingSummary {
    /// Pairs with an identified structure (flag 0).
    pub documented: usize,
    /// Pairs with no structural documentation (flag 1).
    pub undocumented: usize,
    /// Pairs classified as a plain bridge.
    pub bridges: usize,
    /// Pairs classified as a plain tunnel.
    pub tunnels: usize,
}

impl CrossingSummary {
    /// Record one classified pair.
    pub fn record(&mut self, structure: &str, flag: i64, bridge_label: &str, tunnel_label: &str) {
        if flag == 0 {
            self.documented += 1;
        } else {
            self.undocumented += 1;
        }
        if structure == bridge_label {
            self.bridges += 1;
        }
        if structure == tunnel_label {
            self.tunnels += 1;
        }
    }
}
