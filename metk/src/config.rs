use serde::Serialize;

use crate::analysis::correlation::DEFAULT_CONFIDENCE;
use crate::analysis::max_correlation::{DEFAULT_RELATIVE_ERROR, DEFAULT_TRIALS};
use crate::models::{CorrelationMethod, Unit};

/// Knobs for the numeric report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOptions {
    /// Relative experimental error fed to the max-correlation simulation.
    pub relative_error: f64,
    pub trials: usize,
    pub method: CorrelationMethod,
    /// Confidence level of the Pearson interval.
    pub confidence: f64,
    /// Seed for the simulation; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            relative_error: DEFAULT_RELATIVE_ERROR,
            trials: DEFAULT_TRIALS,
            method: CorrelationMethod::Pearson,
            confidence: DEFAULT_CONFIDENCE,
            seed: None,
        }
    }
}

/// Per-page image format written next to the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlotFormat {
    Png,
    Svg,
}

impl PlotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PlotFormat::Png => "png",
            PlotFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlotOptions {
    /// Display unit of the IC50 page.
    pub units: Unit,
    /// Also write each page as a standalone image.
    pub extra_format: Option<PlotFormat>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            units: Unit::Micromolar,
            extra_format: None,
        }
    }
}
