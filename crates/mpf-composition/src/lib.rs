//! MPF Composition
//!
//! Combines the draws of independent paths into a single weighted pool.
//!
//! # Core Concepts
//!
//! - [`ResultAggregator`]: Concatenates per-path draws in insertion order
//! - [`AggregatedSet`]: One contiguous ratio vector and sample matrix
//! - [`tail_length`]: Number of upper order statistics to smooth
//! - [`pareto_smooth`]: Generalized-Pareto smoothing of the largest ratios
//!
//! # Example
//!
//! ```rust,ignore
//! use mpf_composition::{pareto_smooth, tail_length, ResultAggregator};
//!
//! let set = ResultAggregator::new().aggregate(successful.iter().map(|(id, d)| (*id, d)))?;
//! let smoothed = pareto_smooth(set.lp_ratios(), tail_length(set.len()));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod aggregate;
mod psis;

pub use aggregate::{AggregatedSet, PathBlock, ResultAggregator};
pub use psis::{gpd_fit, pareto_smooth, SmoothedWeights, TailFit, MIN_TAIL_LEN, PARETO_K_WARN};

use mpf_draws::PathId;

/// Errors raised while combining path draws
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// Nothing to aggregate
    #[error("no successful paths to aggregate")]
    NoSuccessfulPaths,

    /// A path's sample matrix has a different row count than the first path
    #[error("path {path_id} has {found} sample rows, expected {expected}")]
    DimensionMismatch {
        /// Offending path
        path_id: PathId,
        /// Row count of the first path
        expected: usize,
        /// Row count of the offending path
        found: usize,
    },
}

/// Tail length used for Pareto smoothing of `n` ratios
///
/// `min(0.2 * n, 3 * sqrt(n))`
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tail_length(n: usize) -> f64 {
    let n = n as f64;
    (0.2 * n).min(3.0 * n.sqrt())
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
