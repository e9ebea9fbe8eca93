//! Parallel path dispatch
//!
//! Runs every path on a shared rayon pool. Each worker owns the slot of its
//! path id, so the collected results do not depend on scheduling order.
//! A failed path never cancels its siblings; the call returns only after
//! every path has finished.

use crate::config::MultiPathConfig;
use crate::error::{ConfigError, MultiPathError};
use crate::model::PathRunner;
use crate::reporter::Reporter;
use crate::rng::PathSeed;
use mpf_draws::{PathDraws, PathId, PathOutcome, PathResult};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Outcome of the parallel path phase
#[derive(Debug, Clone)]
pub struct PathPhase {
    slots: Vec<Option<PathDraws>>,
    eval_count: u64,
    elapsed: Duration,
}

impl PathPhase {
    /// Number of dispatched paths
    #[inline]
    #[must_use]
    pub fn num_paths(&self) -> usize {
        self.slots.len()
    }

    /// Number of paths that produced draws
    #[must_use]
    pub fn num_successful(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Success flag per path id
    #[must_use]
    pub fn success_mask(&self) -> Vec<bool> {
        self.slots.iter().map(Option::is_some).collect()
    }

    /// Draws of successful paths in path id order
    pub fn successful(&self) -> impl Iterator<Item = (PathId, &PathDraws)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|d| (path_id(i), d)))
    }

    /// Ids of successful paths
    #[must_use]
    pub fn successful_paths(&self) -> Vec<PathId> {
        self.successful().map(|(id, _)| id).collect()
    }

    /// Ids of failed paths
    #[must_use]
    pub fn failed_paths(&self) -> Vec<PathId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| path_id(i))
            .collect()
    }

    /// Evaluations reported by all paths, failed ones included
    #[inline]
    #[must_use]
    pub fn eval_count(&self) -> u64 {
        self.eval_count
    }

    /// Wall time of the phase
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[allow(clippy::cast_possible_truncation)]
fn path_id(index: usize) -> PathId {
    // Slots are sized from a u32 path count
    PathId(index as u32)
}

/// Dispatches paths across a worker pool
#[derive(Debug, Default)]
pub struct ParallelOrchestrator {
    pool: Option<ThreadPool>,
}

impl ParallelOrchestrator {
    /// Orchestrator on the global rayon pool
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Orchestrator with a dedicated pool of `threads` workers
    ///
    /// # Errors
    /// `MultiPathError::WorkerPool` if the pool cannot be built
    pub fn with_threads(threads: usize) -> Result<Self, MultiPathError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mpf-path-{i}"))
            .build()
            .map_err(|e| MultiPathError::WorkerPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    /// Orchestrator sized by `config.num_threads`
    ///
    /// # Errors
    /// `MultiPathError::WorkerPool` if a dedicated pool cannot be built
    pub fn from_config(config: &MultiPathConfig) -> Result<Self, MultiPathError> {
        match config.num_threads {
            Some(threads) => Self::with_threads(threads),
            None => Ok(Self::new()),
        }
    }

    /// Run `config.num_paths` paths and wait for all of them
    ///
    /// Path `i` receives `inits[i]` and the seed
    /// `(config.random_seed, config.path + i)`.
    ///
    /// # Errors
    /// `ConfigError::InitCountMismatch` if `inits` is shorter than the path count
    pub fn run<R>(
        &self,
        runner: &R,
        model: &R::Model,
        inits: &[R::Init],
        config: &MultiPathConfig,
        reporter: &Reporter<'_>,
    ) -> Result<PathPhase, MultiPathError>
    where
        R: PathRunner,
    {
        let num_paths = config.num_paths as usize;
        if inits.len() < num_paths {
            return Err(ConfigError::InitCountMismatch {
                expected: num_paths,
                found: inits.len(),
            }
            .into());
        }

        let span = tracing::info_span!("paths", num_paths);
        let _enter = span.enter();

        let start = Instant::now();
        let eval_count = AtomicU64::new(0);
        let mut slots: Vec<Option<PathDraws>> = vec![None; num_paths];

        let mut dispatch = || {
            slots.par_iter_mut().enumerate().for_each(|(index, slot)| {
                let id = path_id(index);
                let seed = PathSeed::for_path(config.random_seed, config.path, id);
                let result = run_isolated(runner, model, &inits[index], seed, id, config);

                eval_count.fetch_add(result.eval_count, Ordering::Relaxed);
                match result.outcome {
                    PathOutcome::Success(draws) => {
                        tracing::debug!(
                            path = id.0,
                            draws = draws.num_draws(),
                            evals = result.eval_count,
                            "path finished"
                        );
                        *slot = Some(draws);
                    }
                    PathOutcome::Failure { reason } => reporter.path_failed(id, &reason),
                }
            });
        };
        match &self.pool {
            Some(pool) => pool.install(dispatch),
            None => dispatch(),
        }

        let phase = PathPhase {
            slots,
            eval_count: eval_count.into_inner(),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            successful = phase.num_successful(),
            failed = num_paths - phase.num_successful(),
            evals = phase.eval_count,
            "path phase complete"
        );
        Ok(phase)
    }
}

/// Run one path, turning a panic into a failed result
fn run_isolated<R: PathRunner>(
    runner: &R,
    model: &R::Model,
    init: &R::Init,
    seed: PathSeed,
    id: PathId,
    config: &MultiPathConfig,
) -> PathResult {
    panic::catch_unwind(AssertUnwindSafe(|| {
        runner.run_path(model, init, seed, id, &config.optimizer)
    }))
    .unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        PathResult::failure(id, format!("runner panicked: {message}"), 0)
    })
}
