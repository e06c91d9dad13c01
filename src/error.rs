//! Error types for the model bench

use thiserror::Error;

/// Result type alias for bench operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for the model bench
#[derive(Error, Debug)]
pub enum BenchError {
    /// The input file is missing or its contents could not be decoded.
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// The file's column count does not match the expected schema.
    #[error("Schema mismatch: expected {expected} columns, found {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// An estimator rejected its training inputs or failed to converge.
    #[error("Fit error ({model}): {reason}")]
    Fit { model: String, reason: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Shorthand for [`BenchError::Fit`].
    pub fn fit(model: impl Into<String>, reason: impl Into<String>) -> Self {
        BenchError::Fit {
            model: model.into(),
            reason: reason.into(),
        }
    }
}

impl From<polars::error::PolarsError> for BenchError {
    fn from(err: polars::error::PolarsError) -> Self {
        BenchError::DataLoad(err.to_string())
    }
}
