//! Importance weight correction
//!
//! A [`WeightCorrection`] turns concatenated log ratios into non-negative
//! weights. It may log diagnostics but always returns a vector of the same
//! length as its input.

use crate::logger::Logger;
use mpf_composition::{pareto_smooth, TailFit, PARETO_K_WARN};
use ndarray::{Array1, ArrayView1};

/// Converts log importance ratios into resampling weights
pub trait WeightCorrection: Send + Sync {
    /// Weights for `lp_ratios`; need not be normalized
    fn correct(&self, lp_ratios: ArrayView1<'_, f64>, tail_len: f64, logger: &dyn Logger)
        -> Array1<f64>;
}

/// Pareto-smoothed importance weights
#[derive(Debug, Clone, Copy, Default)]
pub struct ParetoSmoothing;

impl ParetoSmoothing {
    /// Create new Pareto smoothing correction
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl WeightCorrection for ParetoSmoothing {
    fn correct(
        &self,
        lp_ratios: ArrayView1<'_, f64>,
        tail_len: f64,
        logger: &dyn Logger,
    ) -> Array1<f64> {
        let smoothed = pareto_smooth(lp_ratios, tail_len);

        match smoothed.tail {
            TailFit::Fitted { pareto_k, tail_len } => {
                tracing::debug!(pareto_k, tail_len, "fitted Pareto tail");
                if pareto_k > PARETO_K_WARN {
                    logger.warn(&format!(
                        "Pareto k value ({pareto_k:.2}) is greater than {PARETO_K_WARN}. \
                         Importance resampling was not able to improve the approximation, \
                         which may indicate that the approximation itself is poor."
                    ));
                }
            }
            TailFit::Constant { tail_len } => {
                logger.warn(&format!(
                    "All {tail_len} tail log ratios are identical; skipping Pareto smoothing."
                ));
            }
            TailFit::Unstable { tail_len } => {
                logger.warn(&format!(
                    "Pareto fit over {tail_len} tail ratios was unstable; using raw weights."
                ));
            }
            TailFit::TooShort { tail_len } => {
                logger.debug(&format!(
                    "Tail of {tail_len} ratios too short for Pareto smoothing."
                ));
            }
            TailFit::Degenerate => {
                logger.warn("No finite log importance ratios to weight.");
            }
        }

        smoothed.weights
    }
}

/// Plain importance weights `exp(r - max r)` without tail smoothing
#[derive(Debug, Clone, Copy, Default)]
pub struct RawImportanceWeights;

impl WeightCorrection for RawImportanceWeights {
    fn correct(
        &self,
        lp_ratios: ArrayView1<'_, f64>,
        _tail_len: f64,
        _logger: &dyn Logger,
    ) -> Array1<f64> {
        let max = lp_ratios
            .iter()
            .copied()
            .filter(|r| !r.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return lp_ratios.mapv(|r| if r == f64::INFINITY { 1.0 } else { 0.0 });
        }
        lp_ratios.mapv(|r| if r.is_nan() { 0.0 } else { (r - max).exp() })
    }
}
