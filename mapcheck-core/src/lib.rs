//! Core checks for map data quality.
//!
//! Three batch transforms over in-memory feature collections, built for
//! assessing OpenStreetMap-style extracts before hydrological or
//! engineering use:
//!
//! - [`check_data_model`]: validate feature tags against a declarative
//!   [`DataModel`] and emit per-key outcome flags;
//! - [`trace_connectivity`]: propagate seed labels across geometrically
//!   touching features;
//! - [`find_crossings`]: find and classify crossings between two feature
//!   classes by bridge/tunnel attribution.
//!
//! The crate consumes a geometry kernel (`geo`) and a spatial index
//! (`rstar`); it implements neither. All checks are single-threaded,
//! synchronous, and free of I/O.

#![forbid(unsafe_code)]

mod connectivity;
mod crossings;
mod error;
mod feature;
mod filter;
mod geometry;
mod index;
mod model;
mod report;
mod validate;

pub use connectivity::{CONNECTED_KEY, ConnectivityOptions, trace_connectivity};
pub use crossings::{CrossingOptions, CrossingReport, find_crossings};
pub use error::{CheckError, ModelError};
pub use feature::{Feature, Properties, PropertyValue};
pub use filter::{FilterValue, TagFilter, explode, filter_features};
pub use index::BboxIndex;
pub use model::{
    Combinator, ConditionRule, ConditionSpec, DataModel, DataModelSpec, FieldType, Flag, RangeRule,
    RangeSpec,
};
pub use report::{CrossingSummary, FlagCounts, ValidationSummary};
pub use validate::{ValidateOptions, check_data_model};
