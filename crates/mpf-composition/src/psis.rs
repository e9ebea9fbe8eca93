//! Pareto-smoothed importance weights
//!
//! The largest log ratios are replaced by expected order statistics of a
//! generalized Pareto distribution fitted to them. The fit follows the
//! profile-likelihood grid of Zhang & Stephens (2009) with a weakly
//! informative prior pulling the shape towards 0.5.

use ndarray::{Array1, ArrayView1};
use std::cmp::Ordering;

/// Tails shorter than this are left unsmoothed
pub const MIN_TAIL_LEN: usize = 5;

/// Shape estimates above this indicate unreliable weights
pub const PARETO_K_WARN: f64 = 0.7;

const GRID_MIN_POINTS: usize = 30;
const PRIOR_SCALE: f64 = 3.0;
const PRIOR_STRENGTH: f64 = 10.0;
const PRIOR_K: f64 = 0.5;

/// How the tail was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TailFit {
    /// Tail was smoothed with the fitted shape
    Fitted {
        /// Estimated Pareto shape
        pareto_k: f64,
        /// Number of smoothed ratios
        tail_len: usize,
    },
    /// Fit produced a non-finite shape; raw tail kept
    Unstable {
        /// Number of ratios in the tail
        tail_len: usize,
    },
    /// Tail too short to fit
    TooShort {
        /// Number of ratios in the tail
        tail_len: usize,
    },
    /// Every tail ratio is identical
    Constant {
        /// Number of ratios in the tail
        tail_len: usize,
    },
    /// No ratio carries any weight
    Degenerate,
}

impl TailFit {
    /// Fitted shape, if any
    #[inline]
    #[must_use]
    pub fn pareto_k(&self) -> Option<f64> {
        match self {
            Self::Fitted { pareto_k, .. } => Some(*pareto_k),
            _ => None,
        }
    }
}

/// Normalized weights together with the tail diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedWeights {
    /// Non-negative weights summing to one, or all zero when degenerate
    pub weights: Array1<f64>,
    /// Tail handling outcome
    pub tail: TailFit,
}

/// Smooth the upper tail of `log_ratios` and return normalized weights
///
/// NaN ratios receive zero weight. If every ratio is `-inf` or NaN the
/// returned weights are all zero and `tail` is [`TailFit::Degenerate`].
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn pareto_smooth(log_ratios: ArrayView1<'_, f64>, tail_len: f64) -> SmoothedWeights {
    let n = log_ratios.len();
    let mut lw: Array1<f64> = log_ratios.mapv(|r| if r.is_nan() { f64::NEG_INFINITY } else { r });

    let max = lw.fold(f64::NEG_INFINITY, |acc, &r| acc.max(r));
    if max == f64::NEG_INFINITY {
        return SmoothedWeights {
            weights: Array1::zeros(n),
            tail: TailFit::Degenerate,
        };
    }
    if max == f64::INFINITY {
        // Infinite ratios dominate everything else
        let weights = lw.mapv(|r| if r == f64::INFINITY { 1.0 } else { 0.0 });
        return SmoothedWeights {
            weights: normalize(weights),
            tail: TailFit::Degenerate,
        };
    }
    lw.mapv_inplace(|r| r - max);

    let tail_len = if tail_len.is_finite() && tail_len > 0.0 {
        (tail_len.ceil() as usize).min(n.saturating_sub(1))
    } else {
        0
    };

    let tail = if tail_len < MIN_TAIL_LEN {
        TailFit::TooShort { tail_len }
    } else {
        smooth_tail(&mut lw, tail_len)
    };

    // Smoothed values may not exceed the largest raw ratio
    lw.mapv_inplace(|r| r.min(0.0));

    SmoothedWeights {
        weights: normalize(lw.mapv(f64::exp)),
        tail,
    }
}

/// Replace the `tail_len` largest entries of `lw` in place
#[allow(clippy::cast_precision_loss)]
fn smooth_tail(lw: &mut Array1<f64>, tail_len: usize) -> TailFit {
    let mut order: Vec<usize> = (0..lw.len()).collect();
    order.sort_by(|&a, &b| lw[b].total_cmp(&lw[a]));

    let cutoff = lw[order[tail_len]];
    // Ascending tail indices
    let tail_idx: Vec<usize> = order[..tail_len].iter().rev().copied().collect();

    let lowest = lw[tail_idx[0]];
    let highest = lw[tail_idx[tail_len - 1]];
    if lowest == highest {
        return TailFit::Constant { tail_len };
    }

    let exp_cutoff = cutoff.exp();
    let excess: Vec<f64> = tail_idx.iter().map(|&i| lw[i].exp() - exp_cutoff).collect();

    let (k, sigma) = gpd_fit(&excess);
    if !k.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
        return TailFit::Unstable { tail_len };
    }

    for (rank, &i) in tail_idx.iter().enumerate() {
        let p = (rank as f64 + 0.5) / tail_len as f64;
        lw[i] = (gpd_quantile(p, k, sigma) + exp_cutoff).ln();
    }

    TailFit::Fitted {
        pareto_k: k,
        tail_len,
    }
}

/// Fit a generalized Pareto distribution to ascending exceedances
///
/// Returns `(k, sigma)`, or NaNs when the data cannot support a fit.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn gpd_fit(x: &[f64]) -> (f64, f64) {
    let n = x.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let nf = n as f64;
    let x_max = x[n - 1];
    // First quartile, 1-based index floor(n/4 + 0.5)
    let q_idx = ((nf / 4.0 + 0.5).floor() as usize).clamp(1, n) - 1;
    let x_star = x[q_idx];
    if x_max <= 0.0 || x_star <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let m = GRID_MIN_POINTS + nf.sqrt().floor() as usize;
    let mf = m as f64;
    let theta: Vec<f64> = (1..=m)
        .map(|j| 1.0 / x_max + (1.0 - (mf / (j as f64 - 0.5)).sqrt()) / PRIOR_SCALE / x_star)
        .collect();

    let log_lik: Vec<f64> = theta
        .iter()
        .map(|&t| {
            let ll = nf * profile_log_lik(t, x);
            if ll.is_nan() {
                f64::NEG_INFINITY
            } else {
                ll
            }
        })
        .collect();

    let ll_max = log_lik
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .unwrap_or(f64::NEG_INFINITY);
    if !ll_max.is_finite() {
        return (f64::NAN, f64::NAN);
    }
    let w: Vec<f64> = log_lik.iter().map(|l| (l - ll_max).exp()).collect();
    let w_sum: f64 = w.iter().sum();
    let theta_hat: f64 = theta.iter().zip(&w).map(|(t, w)| t * w).sum::<f64>() / w_sum;

    let k = x.iter().map(|&xi| (-theta_hat * xi).ln_1p()).sum::<f64>() / nf;
    let sigma = -k / theta_hat;
    let k = (k * nf + PRIOR_K * PRIOR_STRENGTH) / (nf + PRIOR_STRENGTH);
    (k, sigma)
}

#[allow(clippy::cast_precision_loss)]
fn profile_log_lik(theta: f64, x: &[f64]) -> f64 {
    let k = x.iter().map(|&xi| (-theta * xi).ln_1p()).sum::<f64>() / x.len() as f64;
    (-theta / k).ln() - k - 1.0
}

fn gpd_quantile(p: f64, k: f64, sigma: f64) -> f64 {
    if k.abs() < f64::EPSILON {
        -sigma * (-p).ln_1p()
    } else {
        sigma * (-k * (-p).ln_1p()).exp_m1() / k
    }
}

fn normalize(mut weights: Array1<f64>) -> Array1<f64> {
    let total = weights.sum();
    if total > 0.0 && total.is_finite() {
        weights.mapv_inplace(|w| w / total);
    }
    weights
}
