//! Pearson, Spearman and Kendall correlation with significance values, and
//! the Fisher-z confidence interval for Pearson r.

use std::cmp::Ordering;

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use tracing::debug;

use crate::error::{MetkError, Result};
use crate::models::{Correlation, CorrelationMethod, CorrelationResult};

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

impl CorrelationMethod {
    pub fn compute(self, x: &[f64], y: &[f64]) -> Result<Correlation> {
        match self {
            CorrelationMethod::Pearson => pearson(x, y),
            CorrelationMethod::Spearman => spearman(x, y),
            CorrelationMethod::Kendall => kendall_tau(x, y),
        }
    }
}

fn check_pairs(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(MetkError::ShapeMismatch {
            predicted: x.len(),
            reference: y.len(),
        });
    }
    if x.is_empty() {
        return Err(MetkError::EmptyInput("correlation"));
    }
    Ok(())
}

/// Plain Pearson coefficient; `None` when either side has zero variance.
fn pearson_coefficient(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut num, mut denom_x, mut denom_y) = (0.0, 0.0, 0.0);
    for (&xx, &yy) in x.iter().zip(y.iter()) {
        let dx = xx - mean_x;
        let dy = yy - mean_y;
        num += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    let denom = denom_x.sqrt() * denom_y.sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((num / denom).clamp(-1.0, 1.0))
}

/// Two-sided p-value of r under H0: rho = 0, via Student's t with n-2 df.
fn t_test_p_value(r: f64, n: usize) -> Result<f64> {
    if n < 3 {
        return Ok(1.0);
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }
    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| MetkError::InvalidParameter(e.to_string()))?;
    Ok(2.0 * (1.0 - dist.cdf(t.abs())))
}

pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation> {
    check_pairs(x, y)?;
    match pearson_coefficient(x, y) {
        Some(r) => Ok(Correlation {
            coefficient: r,
            p_value: t_test_p_value(r, x.len())?,
        }),
        None => {
            debug!("zero variance input; reporting degenerate Pearson correlation");
            Ok(Correlation::DEGENERATE)
        }
    }
}

/// 1-based ranks, ties sharing their average rank.
fn rank_data(vals: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = vals.iter().cloned().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; vals.len()];
    let mut i = 0;
    while i < indexed.len() {
        let val = indexed[i].1;
        let mut j = i + 1;
        while j < indexed.len() && indexed[j].1 == val {
            j += 1;
        }

        let avg_rank = ((i + 1) as f64 + j as f64) / 2.0;
        for k in i..j {
            ranks[indexed[k].0] = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Spearman's rho: Pearson on average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<Correlation> {
    check_pairs(x, y)?;
    pearson(&rank_data(x), &rank_data(y))
}

/// Tie statistics `(Σ t(t-1)/2, Σ t(t-1)(t-2), Σ t(t-1)(2t+5))` over tie groups.
fn tie_counts(vals: &[f64]) -> (f64, f64, f64) {
    let mut sorted = vals.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let (mut pairs, mut t0, mut t1) = (0.0, 0.0, 0.0);
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            pairs += t * (t - 1.0) / 2.0;
            t0 += t * (t - 1.0) * (t - 2.0);
            t1 += t * (t - 1.0) * (2.0 * t + 5.0);
        }
        i = j;
    }
    (pairs, t0, t1)
}

fn sign(d: f64) -> f64 {
    if d > 0.0 {
        1.0
    } else if d < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Kendall's tau-b with the tie-corrected normal approximation p-value.
pub fn kendall_tau(x: &[f64], y: &[f64]) -> Result<Correlation> {
    check_pairs(x, y)?;
    let n = x.len();

    let mut con_minus_dis = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            con_minus_dis += sign(x[i] - x[j]) * sign(y[i] - y[j]);
        }
    }

    let total = (n * (n.saturating_sub(1))) as f64 / 2.0;
    let (x_tie, x0, x1) = tie_counts(x);
    let (y_tie, y0, y1) = tie_counts(y);
    let denom = ((total - x_tie) * (total - y_tie)).sqrt();
    if denom == 0.0 {
        debug!("all pairs tied; reporting degenerate Kendall correlation");
        return Ok(Correlation::DEGENERATE);
    }
    let tau = (con_minus_dis / denom).clamp(-1.0, 1.0);

    let nf = n as f64;
    let m = nf * (nf - 1.0);
    let mut var = (m * (2.0 * nf + 5.0) - x1 - y1) / 18.0 + (2.0 * x_tie * y_tie) / m;
    if n > 2 {
        var += x0 * y0 / (9.0 * m * (nf - 2.0));
    }
    let p_value = if var > 0.0 {
        let z = con_minus_dis / var.sqrt();
        2.0 * (1.0 - Normal::standard().cdf(z.abs()))
    } else {
        1.0
    };

    Ok(Correlation {
        coefficient: tau,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// Confidence bounds for a Pearson `r` (not R^2) from `n` samples.
///
/// Works in Fisher z space: `tanh(atanh(r) ± z_conf / sqrt(n - 3))`, with
/// `z_conf` the standard normal quantile at `confidence`.
pub fn pearson_confidence_interval(r: f64, n: usize, confidence: f64) -> Result<(f64, f64)> {
    if n <= 3 {
        return Err(MetkError::InsufficientSampleSize(n));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(MetkError::InvalidParameter(format!(
            "confidence must lie in (0, 1), got {confidence}"
        )));
    }
    let stderr = 1.0 / ((n - 3) as f64).sqrt();
    let z_score = Normal::standard().inverse_cdf(confidence);
    let delta = z_score * stderr;
    let lower = (r.atanh() - delta).tanh();
    let upper = (r.atanh() + delta).tanh();
    Ok((lower, upper))
}

/// Pearson r with its confidence interval, all on the signed scale.
pub fn pearson_with_interval(x: &[f64], y: &[f64], confidence: f64) -> Result<CorrelationResult> {
    let corr = pearson(x, y)?;
    let (lower, upper) = pearson_confidence_interval(corr.coefficient, x.len(), confidence)?;
    Ok(CorrelationResult {
        estimate: corr.coefficient,
        lower,
        upper,
        p_value: corr.p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRED: [f64; 4] = [-10.0, -9.0, -8.0, -7.0];
    const EXP: [f64; 4] = [-10.5, -9.2, -7.8, -7.1];

    #[test]
    fn pearson_near_linear() {
        let c = pearson(&PRED, &EXP).unwrap();
        assert!((c.coefficient - 0.991_054_88).abs() < 1e-6, "r = {}", c.coefficient);
        assert!(c.p_value < 0.01);
    }

    #[test]
    fn pearson_perfect_and_anti() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        assert!((pearson(&x, &y).unwrap().coefficient - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &neg).unwrap().coefficient + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &y).unwrap().p_value < 1e-10);
    }

    #[test]
    fn constant_input_is_degenerate_not_nan() {
        let x = [2.0, 2.0, 2.0, 2.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        for method in [
            CorrelationMethod::Pearson,
            CorrelationMethod::Spearman,
            CorrelationMethod::Kendall,
        ] {
            assert_eq!(method.compute(&x, &y).unwrap(), Correlation::DEGENERATE);
        }
    }

    #[test]
    fn ranks_average_ties() {
        assert_eq!(rank_data(&[10.0, 20.0, 10.0, 30.0]), vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn spearman_is_rank_based() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 1000.0];
        let s = spearman(&x, &y).unwrap();
        assert!((s.coefficient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn kendall_known_values() {
        let t = kendall_tau(&PRED, &EXP).unwrap();
        assert!((t.coefficient - 1.0).abs() < 1e-12);

        // one discordant pair out of six
        let t = kendall_tau(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert!((t.coefficient - 4.0 / 6.0).abs() < 1e-12);
        assert!(t.p_value > 0.05 && t.p_value <= 1.0);
    }

    #[test]
    fn kendall_with_ties_is_tau_b() {
        // C-D = 5 with one tie in x: tau_b = 5 / sqrt(5 * 6)
        let t = kendall_tau(&[1.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((t.coefficient - 5.0 / 30f64.sqrt()).abs() < 1e-12, "tau {}", t.coefficient);
    }

    #[test]
    fn interval_brackets_r() {
        let (lo, hi) = pearson_confidence_interval(0.8, 50, DEFAULT_CONFIDENCE).unwrap();
        assert!(lo < 0.8 && 0.8 < hi, "({lo}, {hi})");
        assert!(lo > -1.0 && hi < 1.0);
    }

    #[test]
    fn interval_narrows_with_n() {
        let mut prev_width = f64::INFINITY;
        for n in [5, 10, 20, 50, 100, 1000] {
            let (lo, hi) = pearson_confidence_interval(0.8, n, DEFAULT_CONFIDENCE).unwrap();
            let width = hi - lo;
            assert!(width < prev_width, "n = {n}: {width} >= {prev_width}");
            prev_width = width;
        }
    }

    #[test]
    fn interval_requires_four_samples() {
        for n in 0..=3 {
            assert!(matches!(
                pearson_confidence_interval(0.5, n, DEFAULT_CONFIDENCE),
                Err(MetkError::InsufficientSampleSize(got)) if got == n
            ));
        }
    }

    #[test]
    fn interval_uses_one_sided_quantile() {
        let (lo, hi) = pearson_confidence_interval(0.0, 4, DEFAULT_CONFIDENCE).unwrap();
        assert!((hi - 1.644_853_6f64.tanh()).abs() < 1e-6, "hi {hi}");
        assert!((lo + hi).abs() < 1e-12);
    }

    #[test]
    fn interval_rejects_bad_confidence() {
        assert!(matches!(
            pearson_confidence_interval(0.5, 10, 1.0),
            Err(MetkError::InvalidParameter(_))
        ));
    }

    #[test]
    fn squaring_happens_after_interval() {
        let res = pearson_with_interval(&PRED, &EXP, DEFAULT_CONFIDENCE).unwrap();
        let (r2, lo2, hi2) = res.squared();
        assert!((r2 - 0.982_19).abs() < 1e-4);
        assert!((lo2 - 0.615_94).abs() < 1e-4, "lo2 {lo2}");
        assert!((hi2 - 0.999_33).abs() < 1e-4, "hi2 {hi2}");
    }
}
