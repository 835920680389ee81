use crate::error::{MetkError, Result};
use crate::models::ErrorBin;

/// Bin edges for absolute ΔG error, kcal/mol.
pub const KCAL_ERROR_BINS: [f64; 2] = [1.0, 2.0];
/// Bin edges for fold error in Ki / IC50.
pub const FOLD_ERROR_BINS: [f64; 2] = [5.0, 10.0];

fn check_pairs(predicted: &[f64], reference: &[f64]) -> Result<()> {
    if predicted.len() != reference.len() {
        return Err(MetkError::ShapeMismatch {
            predicted: predicted.len(),
            reference: reference.len(),
        });
    }
    if predicted.is_empty() {
        return Err(MetkError::EmptyInput("error metric"));
    }
    Ok(())
}

/// Root mean squared error between paired values.
pub fn root_mean_squared_error(predicted: &[f64], reference: &[f64]) -> Result<f64> {
    check_pairs(predicted, reference)?;
    let sum_sq: f64 = predicted
        .iter()
        .zip(reference)
        .map(|(p, r)| (p - r).powi(2))
        .sum();
    Ok((sum_sq / predicted.len() as f64).sqrt())
}

/// Mean absolute error between paired values.
pub fn mean_absolute_error(predicted: &[f64], reference: &[f64]) -> Result<f64> {
    check_pairs(predicted, reference)?;
    let sum_abs: f64 = predicted
        .iter()
        .zip(reference)
        .map(|(p, r)| (p - r).abs())
        .sum();
    Ok(sum_abs / predicted.len() as f64)
}

/// Absolute per-pair error in kcal/mol.
pub fn kcal_errors(predicted: &[f64], experimental: &[f64]) -> Result<Vec<f64>> {
    check_pairs(predicted, experimental)?;
    Ok(predicted
        .iter()
        .zip(experimental)
        .map(|(p, e)| (e - p).abs())
        .collect())
}

/// Per-pair fold error `10^|log10(exp) - log10(pred)|` for concentrations.
pub fn fold_errors(predicted: &[f64], experimental: &[f64]) -> Result<Vec<f64>> {
    check_pairs(predicted, experimental)?;
    Ok(predicted
        .iter()
        .zip(experimental)
        .map(|(p, e)| 10f64.powf((e.log10() - p.log10()).abs()))
        .collect())
}

/// Classifies each error against `thresholds`.
pub fn bin_errors(errors: &[f64], thresholds: [f64; 2]) -> Vec<ErrorBin> {
    errors
        .iter()
        .map(|&e| ErrorBin::classify(e, thresholds))
        .collect()
}

/// Fraction of errors falling in each of the three bins.
pub fn normalized_histogram(errors: &[f64], thresholds: [f64; 2]) -> [f64; 3] {
    let mut counts = [0usize; 3];
    for bin in bin_errors(errors, thresholds) {
        counts[bin.index()] += 1;
    }
    let total = errors.len().max(1) as f64;
    counts.map(|c| c as f64 / total)
}
