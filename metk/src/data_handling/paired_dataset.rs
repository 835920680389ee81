use polars::prelude::*;
use tracing::{error, info};

use crate::data_handling::Dataset;
use crate::error::{MetkError, Result};
use crate::helper_functions::{extract_column, has_column, read_csv};
use crate::models::{PairedSamples, Unit};

pub const PRED_COLUMN: &str = "Pred";
pub const EXP_COLUMN: &str = "Exp";

/// CSV with "Pred" and "Exp" columns.
///
/// Values are kcal/mol unless `input_units` is set, in which case both
/// columns hold Ki / IC50 in that unit and are converted on load.
pub struct PairedCsvDataset {
    pub path: String,
    pub input_units: Option<Unit>,
}

/// Fails with the first of "Pred" / "Exp" absent from `df`.
pub fn check_dataframe(df: &DataFrame) -> Result<()> {
    for column in [PRED_COLUMN, EXP_COLUMN] {
        if !has_column(df, column) {
            return Err(MetkError::MissingColumn(column.to_string()));
        }
    }
    Ok(())
}

/// Turns a validated frame into paired samples in kcal/mol.
pub fn samples_from_frame(df: &DataFrame, input_units: Option<Unit>) -> Result<PairedSamples> {
    check_dataframe(df)?;
    if df.height() == 0 {
        return Err(MetkError::EmptyInput("input table"));
    }
    let pred = extract_column(df, PRED_COLUMN)?;
    let exp = extract_column(df, EXP_COLUMN)?;
    match input_units {
        Some(unit) => {
            info!("Converting input from {} to kcal/mol", unit);
            PairedSamples::from_concentration(&pred, &exp, unit)
        }
        None => PairedSamples::new(pred, exp),
    }
}

impl Dataset for PairedCsvDataset {
    fn load(&self) -> Result<DataFrame> {
        info!("Reading data from {}", &self.path);
        let df = match read_csv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read input CSV: {}", e);
                return Err(e.into());
            }
        };
        Ok(df)
    }

    fn load_validated(&self) -> Result<PairedSamples> {
        let df = self.load()?;
        let samples = samples_from_frame(&df, self.input_units)?;
        info!("Loaded {} paired values", samples.len());
        Ok(samples)
    }
}
