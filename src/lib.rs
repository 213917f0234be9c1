//! Facade crate for the map data-quality checks.
//!
//! This crate re-exports the core check types and the GeoJSON
//! reader/writer so callers can depend on a single crate.

#![forbid(unsafe_code)]

pub use mapcheck_core::{
    BboxIndex, CONNECTED_KEY, CheckError, Combinator, ConditionRule, ConditionSpec,
    ConnectivityOptions, CrossingOptions, CrossingReport, CrossingSummary, DataModel,
    DataModelSpec, Feature, FieldType, FilterValue, Flag, FlagCounts, ModelError, Properties,
    PropertyValue, RangeRule, RangeSpec, TagFilter, ValidateOptions, ValidationSummary,
    check_data_model, explode, filter_features, find_crossings, trace_connectivity,
};
pub use mapcheck_io::{GeoJsonError, read_collection, write_collection};
