//! Error types shared by the statistics core, the dataset loader and the CLI.

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, MetkError>;

#[derive(Error, Debug)]
pub enum MetkError {
    /// Concentration unit outside the recognised set.
    #[error("{0} is not a supported unit (expected uM or nM)")]
    UnsupportedUnit(String),

    /// Paired sequences of different length.
    #[error("predicted values have length {predicted} but reference values have length {reference}")]
    ShapeMismatch { predicted: usize, reference: usize },

    /// Too few samples for the Fisher-z interval (needs n > 3).
    #[error("at least 4 samples are required, got {0}")]
    InsufficientSampleSize(usize),

    /// Empty sequence where data is required.
    #[error("no values supplied for {0}")]
    EmptyInput(&'static str),

    /// Required column absent from the input table.
    #[error("Input Error: Your input file does not have a column named \"{0}\"")]
    MissingColumn(String),

    /// Parameter outside its domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Null, non-numeric or non-finite cell in a required column.
    #[error("Input Error: column \"{column}\" has a missing or non-finite value in row {row}")]
    InvalidValue { column: String, row: usize },

    #[error("failed to read input table: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any error raised by the plotting backend.
    #[error("failed to draw plot: {0}")]
    Plot(String),
}

/// Wraps a drawing-area error into [`MetkError::Plot`].
pub fn plot_err<E: std::fmt::Display>(e: E) -> MetkError {
    MetkError::Plot(e.to_string())
}
