use thiserror::Error;

use crate::dataset::Column;

/// Failures while turning a source file into a `Dataset`. Any of these aborts the load;
/// no partial dataset is returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read transaction source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed transaction CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' is missing from the header")]
    MissingColumn(String),

    #[error("Row {row}: cannot resolve timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("Row {row}: fraud flag must be 0 or 1, got {value}")]
    InvalidFraudFlag { row: usize, value: i64 },

    #[error("Row {row}: required column '{column}' is empty")]
    EmptyIdentifier { row: usize, column: Column },
}

/// Invalid or unanswerable queries against a loaded `Dataset`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid period '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Unknown reducer '{0}', expected sum, mean or count")]
    UnknownReducer(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(Column),

    #[error("Metric '{metric}' is undefined for '{group}' (no non-missing values)")]
    UndefinedMetric { metric: String, group: String },
}
