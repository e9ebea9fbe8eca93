//! Multi-path run
//!
//! Header-write, parallel paths, then either abort (no successes) or
//! aggregate, resample, stream and report timing.

use crate::config::MultiPathConfig;
use crate::error::{error_codes, ConfigError, MultiPathError};
use crate::logger::{Logger, TracingLogger};
use crate::model::{PathRunner, TargetModel};
use crate::orchestrator::ParallelOrchestrator;
use crate::reporter::{PhaseTimings, Reporter};
use crate::resampler::ImportanceResampler;
use crate::weights::{ParetoSmoothing, WeightCorrection};
use crate::writer::Writer;
use mpf_composition::ResultAggregator;
use mpf_draws::PathId;
use std::sync::Arc;
use std::time::Instant;

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPathSummary {
    /// Paths that produced draws, in id order
    pub successful_paths: Vec<PathId>,
    /// Paths that failed, in id order
    pub failed_paths: Vec<PathId>,
    /// Evaluations reported by every path
    pub eval_count: u64,
    /// Draws pooled across successful paths
    pub pooled_draws: usize,
    /// Pooled column chosen for each output row
    pub drawn_indices: Vec<usize>,
    /// Phase wall times
    pub timings: PhaseTimings,
}

impl MultiPathSummary {
    /// Status code of a completed run
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> i32 {
        error_codes::OK
    }
}

/// Multi-start variational inference with importance resampling
///
/// # Example
///
/// ```rust,ignore
/// use mpf_core::{CsvWriter, MultiPathConfig, MultiPathFinder, NullWriter};
///
/// let finder = MultiPathFinder::new(MultiPathConfig::new().with_seed(42));
/// let mut params = CsvWriter::new(std::io::stdout().lock());
/// let summary = finder.run(&runner, &model, &inits, &mut params, &mut NullWriter)?;
/// println!("{} combined draws", summary.drawn_indices.len());
/// ```
#[derive(Clone)]
pub struct MultiPathFinder<C = ParetoSmoothing> {
    config: MultiPathConfig,
    correction: C,
    logger: Arc<dyn Logger>,
}

impl<C: std::fmt::Debug> std::fmt::Debug for MultiPathFinder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiPathFinder")
            .field("config", &self.config)
            .field("correction", &self.correction)
            .finish_non_exhaustive()
    }
}

impl MultiPathFinder<ParetoSmoothing> {
    /// Create with Pareto smoothing and a `tracing` logger
    #[inline]
    #[must_use]
    pub fn new(config: MultiPathConfig) -> Self {
        Self {
            config,
            correction: ParetoSmoothing::new(),
            logger: Arc::new(TracingLogger),
        }
    }
}

impl<C: WeightCorrection> MultiPathFinder<C> {
    /// Replace the weight correction
    #[inline]
    #[must_use]
    pub fn with_correction<C2: WeightCorrection>(self, correction: C2) -> MultiPathFinder<C2> {
        MultiPathFinder {
            config: self.config,
            correction,
            logger: self.logger,
        }
    }

    /// Replace the logger
    #[inline]
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Run configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MultiPathConfig {
        &self.config
    }

    /// Run every path, combine their draws and write the resampled rows
    ///
    /// Header rows go to both sinks before any path runs, so they are
    /// present even when the run fails afterwards.
    ///
    /// # Errors
    /// - `MultiPathError::Config` for an invalid configuration or too few
    ///   init contexts; nothing is written
    /// - `MultiPathError::NoSuccessfulPaths` if every path failed
    /// - `MultiPathError::Composition` if path row counts disagree
    /// - `MultiPathError::Resample` if the weights are unusable
    /// - `MultiPathError::Output` if a sink fails
    pub fn run<R, P, D>(
        &self,
        runner: &R,
        model: &R::Model,
        inits: &[R::Init],
        params: &mut P,
        diagnostics: &mut D,
    ) -> Result<MultiPathSummary, MultiPathError>
    where
        R: PathRunner,
        P: Writer + ?Sized,
        D: Writer + ?Sized,
    {
        let config = &self.config;
        config.validate()?;
        let num_paths = config.num_paths as usize;
        // Checked here as well as in the orchestrator so a short init list
        // fails before the headers are written
        if inits.len() < num_paths {
            return Err(ConfigError::InitCountMismatch {
                expected: num_paths,
                found: inits.len(),
            }
            .into());
        }
        let orchestrator = ParallelOrchestrator::from_config(config)?;

        let span = tracing::info_span!("multi_path", model = model.name(), num_paths);
        let _enter = span.enter();
        tracing::info!(seed = config.random_seed, path = config.path, "starting multi-path run");

        let reporter = Reporter::new(self.logger.as_ref());
        let names = Reporter::header_names(model.constrained_param_names());
        reporter.write_headers(&names, params, diagnostics)?;

        let phase = orchestrator.run(runner, model, inits, config, &reporter)?;
        if phase.num_successful() == 0 {
            reporter.no_successful_paths();
            return Err(MultiPathError::NoSuccessfulPaths);
        }
        reporter.eval_summary(phase.eval_count(), config.refresh());

        let resample_start = Instant::now();
        let set = ResultAggregator::new().aggregate(phase.successful())?;
        let resampler = ImportanceResampler::from_config(config);
        let drawn_indices = resampler.resample(
            &set,
            &self.correction,
            config.num_multi_draws,
            params,
            self.logger.as_ref(),
        )?;

        let timings = PhaseTimings {
            paths: phase.elapsed(),
            resample: resample_start.elapsed(),
        };
        reporter.write_timing(params, &timings)?;

        tracing::info!(
            pooled = set.len(),
            written = drawn_indices.len(),
            "multi-path run complete"
        );

        Ok(MultiPathSummary {
            successful_paths: phase.successful_paths(),
            failed_paths: phase.failed_paths(),
            eval_count: phase.eval_count(),
            pooled_draws: set.len(),
            drawn_indices,
            timings,
        })
    }
}
