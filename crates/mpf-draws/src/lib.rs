//! MPF Draw Containers
//!
//! Typed containers for the output of a single variational path.
//!
//! # Core Concepts
//!
//! - [`PathId`]: Index of a path within one multi-path run
//! - [`PathDraws`]: Log importance ratios plus the matching sample matrix
//! - [`PathOutcome`]: Success (with draws) or failure (with a reason)
//! - [`PathResult`]: Outcome plus the evaluation count the path reported
//!
//! # Layout
//!
//! Sample matrices are `d x n`: one column per draw, with the model's
//! constrained parameters followed by two trailing rows,
//! [`LP_APPROX_NAME`] (log density of the approximation) and
//! [`LP_NAME`] (log density of the target).
//!
//! # Example
//!
//! ```rust,ignore
//! use mpf_draws::{PathDraws, PathId, PathResult};
//! use ndarray::{array, Array1};
//!
//! let draws = PathDraws::new(
//!     Array1::from(vec![-0.1, -0.3]),
//!     array![[0.5, 0.7], [-1.2, -1.0], [-1.1, -1.3]],
//! )?;
//! let result = PathResult::success(PathId(0), draws, 120);
//! assert!(result.is_success());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod draws;
mod result;

pub use draws::{DrawError, PathDraws};
pub use result::{PathId, PathOutcome, PathResult};

/// Header name of the approximate log density row
pub const LP_APPROX_NAME: &str = "lp_approx__";

/// Header name of the exact log density row
pub const LP_NAME: &str = "lp__";

/// Number of synthetic rows appended after the model parameters
pub const SYNTHETIC_ROWS: usize = 2;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
