//! Compile-time error taxonomy.
//!
//! Every error here means the request was malformed or violated catalog
//! policy. Nothing is retryable and nothing produces partial output: the
//! first error aborts the whole compilation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The public field name has no catalog entry.
    #[error("field '{0}' is not mapped to a backend field")]
    FieldNotMapped(String),

    #[error("field '{field}' does not allow operator '{operator}'")]
    OperatorNotAllowed { field: String, operator: String },

    /// A list value was supplied to a field or operator that only takes
    /// a scalar.
    #[error("field '{field}' does not support multi-select")]
    MultiSelectNotAllowed { field: String },

    #[error("field '{field}' has an empty list of values")]
    EmptyValueList { field: String },

    #[error("field '{field}' has no value set")]
    NoValue { field: String },

    #[error("field '{field}' expects a {expected} value, got '{got}'")]
    WrongValueType {
        field: String,
        expected: &'static str,
        got: String,
    },

    /// Enum control type: value not in the catalog's allowed list.
    #[error("field '{field}' does not allow value '{value}'")]
    ValueNotAllowed { field: String, value: String },

    /// Kept distinct from [`CompileError::WrongValueType`]: some callers
    /// substitute a sentinel UUID and continue instead of rejecting the
    /// whole request.
    #[error("field '{field}' has an invalid UUID '{value}'")]
    InvalidUuid { field: String, value: String },

    #[error("field '{field}' has an invalid timestamp '{value}'")]
    InvalidTimestamp { field: String, value: String },

    #[error("field '{field}': betweenDates expects exactly 2 values, got {got}")]
    BetweenDatesLength { field: String, got: usize },

    /// Nested key/value fields need exactly one key to pick the entry
    /// being matched.
    #[error("nested field '{field}' requires exactly one key, got {got}")]
    NestedKeyCount { field: String, got: usize },

    /// More than one field was supplied without saying how they combine.
    #[error("request has {0} fields but no logic operator")]
    MissingLogicOperator(usize),

    #[error("unknown sort column '{column}', valid columns: {valid}")]
    UnknownSortColumn { column: String, valid: String },

    /// The sort column only exists as a grouped-search metric; it
    /// cannot order rows, relational or otherwise.
    #[error("sort column '{0}' is aggregated and cannot order row-level results")]
    SortColumnNotRelational(String),

    #[error("page size must be positive, got {0}")]
    InvalidPageSize(i64),

    #[error("page index must not be negative, got {0}")]
    InvalidPageIndex(i64),
}
