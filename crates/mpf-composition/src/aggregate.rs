//! Concatenation of per-path draws
//!
//! Path blocks keep their internal column order and appear in the order
//! they were supplied.

use crate::CompositionError;
use mpf_draws::{PathDraws, PathId};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, Slice};

/// Column range contributed by one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBlock {
    /// Contributing path
    pub path_id: PathId,
    /// First column of the block
    pub offset: usize,
    /// Number of columns in the block
    pub len: usize,
}

/// Draws of every successful path in one contiguous layout
///
/// # Invariants
/// - `lp_ratios.len() == samples.ncols() == sum of block lengths`
/// - blocks are contiguous and sorted by offset
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSet {
    lp_ratios: Array1<f64>,
    samples: Array2<f64>,
    blocks: Vec<PathBlock>,
}

impl AggregatedSet {
    /// Concatenated log importance ratios
    #[inline]
    #[must_use]
    pub fn lp_ratios(&self) -> ArrayView1<'_, f64> {
        self.lp_ratios.view()
    }

    /// Concatenated sample matrix
    #[inline]
    #[must_use]
    pub fn samples(&self) -> ArrayView2<'_, f64> {
        self.samples.view()
    }

    /// Sample column `index`
    ///
    /// # Panics
    /// Panics if `index >= self.len()`
    #[inline]
    #[must_use]
    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.samples.index_axis(Axis(1), index)
    }

    /// Total number of draws
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lp_ratios.len()
    }

    /// Check if no draws were aggregated
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lp_ratios.is_empty()
    }

    /// Rows per draw
    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.samples.nrows()
    }

    /// Per-path column blocks
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[PathBlock] {
        &self.blocks
    }

    /// Path that contributed column `index`
    #[must_use]
    pub fn path_of(&self, index: usize) -> Option<PathId> {
        if index >= self.len() {
            return None;
        }
        // Last block starting at or before `index`; zero-length blocks share offsets.
        let pos = self.blocks.partition_point(|b| b.offset <= index);
        self.blocks[..pos]
            .iter()
            .rev()
            .find(|b| index < b.offset + b.len)
            .map(|b| b.path_id)
    }
}

/// Concatenates successful path draws into an [`AggregatedSet`]
///
/// Every path must carry the same number of sample rows as the first one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Create new aggregator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Concatenate draws in the order given
    ///
    /// # Errors
    /// - `CompositionError::NoSuccessfulPaths` if `paths` is empty
    /// - `CompositionError::DimensionMismatch` if a path's row count differs
    ///   from the first path's
    pub fn aggregate<'a, I>(&self, paths: I) -> Result<AggregatedSet, CompositionError>
    where
        I: IntoIterator<Item = (PathId, &'a PathDraws)>,
    {
        let paths: Vec<(PathId, &PathDraws)> = paths.into_iter().collect();
        let Some((_, first)) = paths.first() else {
            return Err(CompositionError::NoSuccessfulPaths);
        };
        let rows = first.rows();

        if let Some((path_id, draws)) = paths.iter().find(|(_, d)| d.rows() != rows) {
            return Err(CompositionError::DimensionMismatch {
                path_id: *path_id,
                expected: rows,
                found: draws.rows(),
            });
        }

        let total: usize = paths.iter().map(|(_, d)| d.num_draws()).sum();
        let mut lp_ratios = Array1::<f64>::zeros(total);
        let mut samples = Array2::<f64>::zeros((rows, total));
        let mut blocks = Vec::with_capacity(paths.len());

        let mut offset = 0;
        for (path_id, draws) in paths {
            let len = draws.num_draws();
            let block = Slice::from(offset..offset + len);
            lp_ratios
                .slice_axis_mut(Axis(0), block)
                .assign(&draws.lp_ratios());
            samples
                .slice_axis_mut(Axis(1), block)
                .assign(&draws.samples());
            blocks.push(PathBlock {
                path_id,
                offset,
                len,
            });
            offset += len;
        }

        Ok(AggregatedSet {
            lp_ratios,
            samples,
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Draws whose entries encode (path, row, column)
    fn tagged_draws(path: u32, rows: usize, cols: usize) -> PathDraws {
        let samples = Array2::from_shape_fn((rows, cols), |(r, c)| {
            f64::from(path) * 1000.0 + (r * 100 + c) as f64
        });
        let ratios = Array1::from_shape_fn(cols, |c| f64::from(path) + c as f64 / 1000.0);
        PathDraws::new(ratios, samples).unwrap()
    }

    #[test]
    fn aggregate_rejects_empty_input() {
        let result = ResultAggregator::new().aggregate(std::iter::empty());
        assert_eq!(result.unwrap_err(), CompositionError::NoSuccessfulPaths);
    }

    #[test]
    fn aggregate_concatenates_in_order() {
        let a = tagged_draws(0, 3, 2);
        let b = tagged_draws(1, 3, 4);

        let set = ResultAggregator::new()
            .aggregate([(PathId(0), &a), (PathId(1), &b)])
            .unwrap();

        assert_eq!(set.len(), 6);
        assert_eq!(set.samples().ncols(), 6);
        assert_eq!(set.rows(), 3);
        assert_eq!(set.column(1).to_vec(), a.samples().column(1).to_vec());
        assert_eq!(set.column(2).to_vec(), b.samples().column(0).to_vec());
        assert_eq!(set.lp_ratios()[5], b.lp_ratios()[3]);
        assert_eq!(
            set.blocks(),
            &[
                PathBlock { path_id: PathId(0), offset: 0, len: 2 },
                PathBlock { path_id: PathId(1), offset: 2, len: 4 },
            ]
        );
    }

    #[test]
    fn aggregate_rejects_mismatched_rows() {
        let a = tagged_draws(0, 3, 2);
        let b = tagged_draws(4, 5, 2);

        let err = ResultAggregator::new()
            .aggregate([(PathId(0), &a), (PathId(4), &b)])
            .unwrap_err();

        assert_eq!(
            err,
            CompositionError::DimensionMismatch {
                path_id: PathId(4),
                expected: 3,
                found: 5,
            }
        );
    }

    #[test]
    fn path_of_skips_empty_blocks() {
        let a = tagged_draws(0, 2, 2);
        let empty = tagged_draws(1, 2, 0);
        let c = tagged_draws(2, 2, 3);

        let set = ResultAggregator::new()
            .aggregate([(PathId(0), &a), (PathId(1), &empty), (PathId(2), &c)])
            .unwrap();

        assert_eq!(set.path_of(0), Some(PathId(0)));
        assert_eq!(set.path_of(1), Some(PathId(0)));
        assert_eq!(set.path_of(2), Some(PathId(2)));
        assert_eq!(set.path_of(4), Some(PathId(2)));
        assert_eq!(set.path_of(5), None);
    }

    proptest! {
        #[test]
        fn aggregate_length_is_sum_of_draws(counts in proptest::collection::vec(0usize..30, 1..8)) {
            let draws: Vec<PathDraws> = counts
                .iter()
                .enumerate()
                .map(|(i, &n)| tagged_draws(i as u32, 4, n))
                .collect();

            let set = ResultAggregator::new()
                .aggregate(draws.iter().enumerate().map(|(i, d)| (PathId(i as u32), d)))
                .unwrap();

            let total: usize = counts.iter().sum();
            prop_assert_eq!(set.len(), total);
            prop_assert_eq!(set.samples().ncols(), total);

            // Columns within each block keep their source order
            for (block, source) in set.blocks().iter().zip(&draws) {
                for c in 0..block.len {
                    prop_assert_eq!(
                        set.column(block.offset + c).to_vec(),
                        source.samples().column(c).to_vec()
                    );
                }
            }
        }
    }
}
