//! Monte Carlo estimate of the best correlation a model could reach given the
//! noise of the experimental measurement (Brown, Muchmore & Hajduk, Drug
//! Discovery Today 2009).

use rand::Rng;
use statrs::distribution::Normal;
use tracing::debug;

use crate::error::{MetkError, Result};
use crate::models::CorrelationMethod;

pub const DEFAULT_RELATIVE_ERROR: f64 = 0.3;
pub const DEFAULT_TRIALS: usize = 1000;

/// Mean correlation between `values` and `trials` noisy copies of them.
///
/// Each copy replaces `v` by `v + N(0, relative_error) * v`, so the noise
/// scales with the magnitude of the value. Only the coefficient of `method`
/// is kept; p-values are discarded. The result is a random estimate whose
/// spread shrinks as `trials` grows; seed `rng` for reproducible output.
pub fn max_possible_correlation<R: Rng + ?Sized>(
    values: &[f64],
    relative_error: f64,
    method: CorrelationMethod,
    trials: usize,
    rng: &mut R,
) -> Result<f64> {
    if values.is_empty() {
        return Err(MetkError::EmptyInput("max possible correlation"));
    }
    if trials == 0 {
        return Err(MetkError::InvalidParameter(
            "trials must be at least 1".to_string(),
        ));
    }
    if !relative_error.is_finite() || relative_error < 0.0 {
        return Err(MetkError::InvalidParameter(format!(
            "relative error must be finite and non-negative, got {relative_error}"
        )));
    }

    let noise = if relative_error > 0.0 {
        Some(
            Normal::new(0.0, relative_error)
                .map_err(|e| MetkError::InvalidParameter(e.to_string()))?,
        )
    } else {
        None
    };

    debug!(
        n = values.len(),
        trials,
        relative_error,
        ?method,
        "simulating max possible correlation"
    );

    let mut noisy = vec![0.0; values.len()];
    let mut total = 0.0;
    for _ in 0..trials {
        for (slot, &v) in noisy.iter_mut().zip(values) {
            let eps = match &noise {
                Some(dist) => rng.sample(dist),
                None => 0.0,
            };
            *slot = v + eps * v;
        }
        total += method.compute(values, &noisy)?.coefficient;
    }
    Ok(total / trials as f64)
}
