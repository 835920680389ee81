use polars::frame::DataFrame;

use crate::error::Result;
use crate::models::PairedSamples;

pub mod paired_dataset;

pub trait Dataset {
    /// Raw table as read from disk.
    fn load(&self) -> Result<DataFrame>;

    /// Table checked for the required columns and turned into kcal/mol pairs.
    fn load_validated(&self) -> Result<PairedSamples>;
}
