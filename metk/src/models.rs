use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{MetkError, Result};

/// Concentration scale used for Ki / IC50 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "uM")]
    Micromolar,
    #[serde(rename = "nM")]
    Nanomolar,
}

impl Unit {
    /// Factor converting a value in this unit to molar.
    pub fn multiplier(self) -> f64 {
        match self {
            Unit::Micromolar => 1e-6,
            Unit::Nanomolar => 1e-9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Unit::Micromolar => "uM",
            Unit::Nanomolar => "nM",
        }
    }
}

impl FromStr for Unit {
    type Err = MetkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uM" => Ok(Unit::Micromolar),
            "nM" => Ok(Unit::Nanomolar),
            other => Err(MetkError::UnsupportedUnit(other.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered (predicted, experimental) pairs.
///
/// Values are in kcal/mol unless the set was produced by
/// [`PairedSamples::to_concentration`]. Construction checks that both
/// sequences are non-empty, equally long and finite, so downstream metrics
/// never see NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedSamples {
    predicted: Vec<f64>,
    experimental: Vec<f64>,
}

impl PairedSamples {
    pub fn new(predicted: Vec<f64>, experimental: Vec<f64>) -> Result<Self> {
        if predicted.len() != experimental.len() {
            return Err(MetkError::ShapeMismatch {
                predicted: predicted.len(),
                reference: experimental.len(),
            });
        }
        if predicted.is_empty() {
            return Err(MetkError::EmptyInput("paired samples"));
        }
        for (column, values) in [("Pred", &predicted), ("Exp", &experimental)] {
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(MetkError::InvalidValue {
                    column: column.to_string(),
                    row,
                });
            }
        }
        Ok(Self {
            predicted,
            experimental,
        })
    }

    pub fn predicted(&self) -> &[f64] {
        &self.predicted
    }

    pub fn experimental(&self) -> &[f64] {
        &self.experimental
    }

    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    /// Always false; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// Which coefficient to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

/// A correlation coefficient with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
}

impl Correlation {
    /// Result reported when either input has zero variance.
    pub const DEGENERATE: Correlation = Correlation {
        coefficient: 0.0,
        p_value: 1.0,
    };
}

/// Pearson r with its Fisher-z confidence bounds, all on the signed r scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
    pub p_value: f64,
}

impl CorrelationResult {
    /// Squares estimate and bounds for R^2 reporting.
    pub fn squared(&self) -> (f64, f64, f64) {
        (
            self.estimate.powi(2),
            self.lower.powi(2),
            self.upper.powi(2),
        )
    }
}

/// Three-way error classification shared by both plot pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorBin {
    Low,
    Medium,
    High,
}

impl ErrorBin {
    /// Bins `error` against two ascending thresholds.
    pub fn classify(error: f64, thresholds: [f64; 2]) -> Self {
        if error < thresholds[0] {
            ErrorBin::Low
        } else if error < thresholds[1] {
            ErrorBin::Medium
        } else {
            ErrorBin::High
        }
    }

    pub fn index(self) -> usize {
        match self {
            ErrorBin::Low => 0,
            ErrorBin::Medium => 1,
            ErrorBin::High => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_units() {
        assert_eq!("uM".parse::<Unit>().unwrap(), Unit::Micromolar);
        assert_eq!("nM".parse::<Unit>().unwrap(), Unit::Nanomolar);
        assert_eq!(Unit::Nanomolar.multiplier(), 1e-9);
    }

    #[test]
    fn rejects_unknown_unit() {
        match "mM".parse::<Unit>() {
            Err(MetkError::UnsupportedUnit(u)) => assert_eq!(u, "mM"),
            other => panic!("expected UnsupportedUnit, got {:?}", other),
        }
    }

    #[test]
    fn paired_samples_validation() {
        assert!(matches!(
            PairedSamples::new(vec![1.0, 2.0], vec![1.0]),
            Err(MetkError::ShapeMismatch { predicted: 2, reference: 1 })
        ));
        assert!(matches!(
            PairedSamples::new(vec![], vec![]),
            Err(MetkError::EmptyInput(_))
        ));
        match PairedSamples::new(vec![1.0, 2.0], vec![1.0, f64::NAN]) {
            Err(MetkError::InvalidValue { column, row }) => {
                assert_eq!(column, "Exp");
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn error_bins() {
        assert_eq!(ErrorBin::classify(0.5, [1.0, 2.0]), ErrorBin::Low);
        assert_eq!(ErrorBin::classify(1.0, [1.0, 2.0]), ErrorBin::Medium);
        assert_eq!(ErrorBin::classify(2.0, [1.0, 2.0]), ErrorBin::High);
    }
}
