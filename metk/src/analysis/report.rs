use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::analysis::correlation::{kendall_tau, pearson_with_interval, spearman};
use crate::analysis::error_metrics::{mean_absolute_error, root_mean_squared_error};
use crate::analysis::max_correlation::max_possible_correlation;
use crate::config::ReportOptions;
use crate::error::Result;
use crate::models::{Correlation, CorrelationResult, PairedSamples, Unit};

/// Every number shown in the text report, plus the options that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub n: usize,
    pub rmse: f64,
    pub mae: f64,
    pub max_correlation: f64,
    /// Signed Pearson r and bounds; squared only when formatted.
    pub pearson: CorrelationResult,
    pub spearman: Correlation,
    pub kendall: Correlation,
    pub options: ReportOptions,
}

/// Computes all report metrics for a kcal/mol sample set.
///
/// The max-correlation simulation runs on `log10(Ki)` of the experimental
/// values with Ki in micromolar.
pub fn compute_metrics<R: Rng + ?Sized>(
    samples: &PairedSamples,
    options: &ReportOptions,
    rng: &mut R,
) -> Result<MetricsSummary> {
    let pred = samples.predicted();
    let expr = samples.experimental();

    let rmse = root_mean_squared_error(pred, expr)?;
    let mae = mean_absolute_error(pred, expr)?;
    let pearson = pearson_with_interval(pred, expr, options.confidence)?;
    let spearman = spearman(pred, expr)?;
    let kendall = kendall_tau(pred, expr)?;

    let log_ki: Vec<f64> = expr
        .iter()
        .map(|&kcal| Unit::Micromolar.log10_concentration_from(kcal))
        .collect();
    let max_correlation = max_possible_correlation(
        &log_ki,
        options.relative_error,
        options.method,
        options.trials,
        rng,
    )?;

    info!(
        n = samples.len(),
        rmse, mae, max_correlation, "computed agreement metrics"
    );

    Ok(MetricsSummary {
        n: samples.len(),
        rmse,
        mae,
        max_correlation,
        pearson,
        spearman,
        kendall,
        options: options.clone(),
    })
}

impl MetricsSummary {
    /// Fixed-format report lines.
    pub fn report_lines(&self) -> Vec<String> {
        let (r2, lower2, upper2) = self.pearson.squared();
        vec![
            format!("N = {}", self.n),
            format!("RMSE = {:.2} kcal/mol", self.rmse),
            format!("MAE  = {:.2} kcal/mol", self.mae),
            format!("Max possible correlation = {:.2}", self.max_correlation),
            format!(
                "Pearson R^2 = {:.2}  {:.0}%CI = {:.2} {:.2}",
                r2,
                self.options.confidence * 100.0,
                lower2,
                upper2
            ),
            format!("Spearman rho = {:.2}", self.spearman.coefficient),
            format!("Kendall tau = {:.2}", self.kendall.coefficient),
        ]
    }
}

/// Builds the text report for a kcal/mol sample set.
pub fn metk_report<R: Rng + ?Sized>(
    samples: &PairedSamples,
    options: &ReportOptions,
    rng: &mut R,
) -> Result<Vec<String>> {
    Ok(compute_metrics(samples, options, rng)?.report_lines())
}
