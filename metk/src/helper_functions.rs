use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::error::{MetkError, Result};

pub fn read_csv(file_path: &str) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))?
        .finish()
}

pub fn has_column(df: &DataFrame, column_name: &str) -> bool {
    df.get_column_names()
        .iter()
        .any(|c| c.as_str() == column_name)
}

/// Reads a column as `f64`, failing on nulls, unparsable cells or non-finite values.
pub fn extract_column(df: &DataFrame, column_name: &str) -> Result<Vec<f64>> {
    if !has_column(df, column_name) {
        return Err(MetkError::MissingColumn(column_name.to_string()));
    }
    let casted = df.column(column_name)?.cast(&DataType::Float64)?;
    let values = casted.f64()?;
    debug!("Extracting {} values from column '{}'", values.len(), column_name);

    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(x) if x.is_finite() => Ok(x),
            _ => Err(MetkError::InvalidValue {
                column: column_name.to_string(),
                row,
            }),
        })
        .collect()
}

/// `(min, max, mean)`; NaN for an empty slice.
pub fn basic_stats(vals: &[f64]) -> (f64, f64, f64) {
    if vals.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN);
    }
    let min = vals.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = vals.iter().sum::<f64>() / vals.len() as f64;
    (min, max, mean)
}

/// Creates the directory that will hold files named `<prefix>...`.
pub fn ensure_prefix_dir(prefix: &str) -> Result<()> {
    if let Some(parent) = Path::new(prefix).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating output directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
