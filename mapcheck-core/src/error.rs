//! Error types shared by the checks.

use thiserror::Error;

/// Fatal data-model configuration errors.
///
/// Raised while a [`crate::DataModel`] is being built, before any feature
/// is processed.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ModelError {
    /// A numeric range did not have exactly two bounds.
    #[error("numeric range for key {key:?} must have exactly 2 bounds, found {count}")]
    InvalidNumericRange {
        /// Key the malformed range was declared for.
        key: String,
        /// Number of bounds actually supplied.
        count: usize,
    },
}

/// Errors raised while a check is running.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum CheckError {
    /// The connectivity tolerance was zero or negative.
    #[error("connectivity tolerance must be positive, got {tolerance}")]
    NonPositiveTolerance {
        /// Tolerance supplied by the caller.
        tolerance: f64,
    },
    /// The connectivity work-list guard tripped.
    #[error("connectivity expansion exceeded the budget of {limit} frontier visits")]
    ExpansionBudgetExceeded {
        /// Maximum number of frontier visits permitted per run.
        limit: usize,
    },
}
