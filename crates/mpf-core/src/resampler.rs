//! Importance resampling
//!
//! Weights the aggregated draws, then draws a fixed number of columns with
//! replacement from the categorical distribution those weights define.
//! Each drawn column is written as soon as it is drawn.

use crate::config::MultiPathConfig;
use crate::error::{MultiPathError, OutputError, ResampleError, Sink};
use crate::logger::Logger;
use crate::rng::PathSeed;
use crate::weights::WeightCorrection;
use crate::writer::Writer;
use mpf_composition::{tail_length, AggregatedSet};
use ndarray::{Array1, ArrayView1};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand_chacha::ChaCha20Rng;

/// Draws representative columns from an [`AggregatedSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportanceResampler {
    seed: PathSeed,
}

impl ImportanceResampler {
    /// Resampler on the stream reserved for `(random_seed, path_offset)`
    #[inline]
    #[must_use]
    pub fn new(random_seed: u64, path_offset: u32) -> Self {
        Self {
            seed: PathSeed::for_resample(random_seed, path_offset),
        }
    }

    /// Resampler seeded from a run configuration
    #[inline]
    #[must_use]
    pub fn from_config(config: &MultiPathConfig) -> Self {
        Self::new(config.random_seed, config.path)
    }

    /// Seed of the resampling stream
    #[inline]
    #[must_use]
    pub fn seed(&self) -> PathSeed {
        self.seed
    }

    /// Importance weights for `set`, smoothed over the computed tail length
    pub fn weights<C>(&self, set: &AggregatedSet, correction: &C, logger: &dyn Logger) -> Array1<f64>
    where
        C: WeightCorrection + ?Sized,
    {
        let tail_len = tail_length(set.len());
        tracing::debug!(draws = set.len(), tail_len, "computing importance weights");
        correction.correct(set.lp_ratios(), tail_len, logger)
    }

    /// Iterator over `num_draws` column indices drawn from `weights`
    ///
    /// Weights are rescaled by their maximum first, so any finite
    /// non-negative vector is accepted regardless of magnitude.
    ///
    /// # Errors
    /// - `ResampleError::InvalidWeight` for a negative or non-finite weight
    /// - `ResampleError::DegenerateWeights` if every weight is zero
    /// - `ResampleError::TooManyWeights` past the sampler's index range
    pub fn draws(
        &self,
        weights: ArrayView1<'_, f64>,
        num_draws: usize,
    ) -> Result<ResampleDraws, ResampleError> {
        let mut max = 0.0_f64;
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ResampleError::InvalidWeight { index, value });
            }
            max = max.max(value);
        }
        if max <= 0.0 {
            return Err(ResampleError::DegenerateWeights);
        }

        // Scaled weights lie in [0, 1], so their sum stays finite
        let dist = WeightedIndex::new(weights.iter().map(|w| w / max)).map_err(|e| match e {
            WeightedError::TooMany => ResampleError::TooManyWeights {
                len: weights.len(),
            },
            WeightedError::NoItem
            | WeightedError::AllWeightsZero
            | WeightedError::InvalidWeight => ResampleError::DegenerateWeights,
        })?;

        Ok(ResampleDraws {
            rng: self.seed.rng(),
            dist,
            remaining: num_draws,
        })
    }

    /// Weight `set`, draw `num_draws` columns and write each one to `writer`
    ///
    /// Returns the drawn column indices in draw order.
    ///
    /// # Errors
    /// - `MultiPathError::Resample` for unusable weights
    /// - `MultiPathError::Output` if the writer fails
    pub fn resample<C, W>(
        &self,
        set: &AggregatedSet,
        correction: &C,
        num_draws: usize,
        writer: &mut W,
        logger: &dyn Logger,
    ) -> Result<Vec<usize>, MultiPathError>
    where
        C: WeightCorrection + ?Sized,
        W: Writer + ?Sized,
    {
        let span = tracing::info_span!("resample", draws = set.len(), num_draws);
        let _enter = span.enter();

        let weights = self.weights(set, correction, logger);
        if weights.len() != set.len() {
            return Err(ResampleError::LengthMismatch {
                weights: weights.len(),
                draws: set.len(),
            }
            .into());
        }

        let draws = self.draws(weights.view(), num_draws)?;
        let mut indices = Vec::with_capacity(num_draws);
        let mut row = Vec::with_capacity(set.rows());
        for index in draws {
            row.clear();
            row.extend(set.column(index).iter().copied());
            writer
                .write_row(&row)
                .map_err(|e| OutputError::new(Sink::Parameter, e))?;
            indices.push(index);
        }

        tracing::debug!(written = indices.len(), "resampled draws written");
        Ok(indices)
    }
}

/// Column indices drawn i.i.d. from a weighted categorical distribution
#[derive(Debug, Clone)]
pub struct ResampleDraws {
    rng: ChaCha20Rng,
    dist: WeightedIndex<f64>,
    remaining: usize,
}

impl Iterator for ResampleDraws {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.dist.sample(&mut self.rng))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ResampleDraws {}
