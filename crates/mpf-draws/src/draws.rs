//! Draw container for a single path
//!
//! Pairs the log importance ratios of a path with its sample matrix and
//! enforces that both describe the same number of draws.

use crate::SYNTHETIC_ROWS;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Errors raised when constructing [`PathDraws`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// Ratio count and sample column count differ
    #[error("ratio count {ratios} does not match sample column count {columns}")]
    LengthMismatch { ratios: usize, columns: usize },

    /// Sample matrix lacks the trailing density rows
    #[error("sample matrix has {rows} rows, need at least {required}")]
    MissingDensityRows { rows: usize, required: usize },
}

/// Draws produced by one successful path
///
/// # Invariants
/// - `lp_ratios.len() == samples.ncols()`
/// - `samples.nrows() >= SYNTHETIC_ROWS`
#[derive(Debug, Clone, PartialEq)]
pub struct PathDraws {
    lp_ratios: Array1<f64>,
    samples: Array2<f64>,
}

impl PathDraws {
    /// Create from explicit ratios and samples
    ///
    /// # Errors
    /// - `DrawError::LengthMismatch` if the ratio count differs from the column count
    /// - `DrawError::MissingDensityRows` if the matrix has fewer than two rows
    pub fn new(lp_ratios: Array1<f64>, samples: Array2<f64>) -> Result<Self, DrawError> {
        if samples.nrows() < SYNTHETIC_ROWS {
            return Err(DrawError::MissingDensityRows {
                rows: samples.nrows(),
                required: SYNTHETIC_ROWS,
            });
        }
        if lp_ratios.len() != samples.ncols() {
            return Err(DrawError::LengthMismatch {
                ratios: lp_ratios.len(),
                columns: samples.ncols(),
            });
        }
        Ok(Self { lp_ratios, samples })
    }

    /// Create from a sample matrix, deriving ratios from its density rows
    ///
    /// Each ratio is `lp__ - lp_approx__` for that column.
    ///
    /// # Errors
    /// `DrawError::MissingDensityRows` if the matrix has fewer than two rows
    pub fn from_samples(samples: Array2<f64>) -> Result<Self, DrawError> {
        let rows = samples.nrows();
        if rows < SYNTHETIC_ROWS {
            return Err(DrawError::MissingDensityRows {
                rows,
                required: SYNTHETIC_ROWS,
            });
        }
        let lp_approx = samples.index_axis(Axis(0), rows - 2);
        let lp = samples.index_axis(Axis(0), rows - 1);
        let lp_ratios = &lp - &lp_approx;
        Ok(Self { lp_ratios, samples })
    }

    /// Log importance ratios, one per draw
    #[inline]
    #[must_use]
    pub fn lp_ratios(&self) -> ArrayView1<'_, f64> {
        self.lp_ratios.view()
    }

    /// Sample matrix, one column per draw
    #[inline]
    #[must_use]
    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.samples.view()
    }

    /// Number of draws (columns)
    #[inline]
    #[must_use]
    pub fn num_draws(&self) -> usize {
        self.lp_ratios.len()
    }

    /// Number of rows per draw, density rows included
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.samples.nrows()
    }

    /// Number of model parameters per draw
    #[inline]
    #[must_use]
    pub fn num_params(&self) -> usize {
        self.samples.nrows() - SYNTHETIC_ROWS
    }

    /// Split into ratios and samples
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Array1<f64>, Array2<f64>) {
        (self.lp_ratios, self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn new_rejects_length_mismatch() {
        let err = PathDraws::new(
            Array1::from(vec![0.0, 0.0, 0.0]),
            Array2::zeros((3, 2)),
        )
        .unwrap_err();

        assert_eq!(err, DrawError::LengthMismatch { ratios: 3, columns: 2 });
    }

    #[test]
    fn new_rejects_missing_density_rows() {
        let err = PathDraws::new(Array1::from(vec![0.0]), Array2::zeros((1, 1))).unwrap_err();
        assert!(matches!(err, DrawError::MissingDensityRows { rows: 1, required: 2 }));
    }

    #[test]
    fn from_samples_uses_trailing_rows() {
        // rows: theta, lp_approx__, lp__
        let samples = array![[0.1, 0.2, 0.3], [-1.0, -2.0, -3.0], [-1.5, -1.0, -3.0]];
        let draws = PathDraws::from_samples(samples).unwrap();

        assert_eq!(draws.lp_ratios().to_vec(), vec![-0.5, 1.0, 0.0]);
        assert_eq!(draws.num_params(), 1);
    }

    #[test]
    fn zero_draw_path_is_valid() {
        let draws = PathDraws::new(Array1::zeros(0), Array2::zeros((4, 0))).unwrap();
        assert_eq!(draws.num_draws(), 0);
        assert_eq!(draws.rows(), 4);
    }

    proptest! {
        #[test]
        fn from_samples_keeps_columns_aligned(rows in 2usize..6, cols in 0usize..40) {
            let samples = Array2::from_shape_fn((rows, cols), |(r, c)| (r * 100 + c) as f64);
            let draws = PathDraws::from_samples(samples).unwrap();

            prop_assert_eq!(draws.num_draws(), cols);
            prop_assert_eq!(draws.samples().ncols(), cols);
            for r in draws.lp_ratios() {
                prop_assert!((r - 100.0).abs() < 1e-12);
            }
        }
    }
}
