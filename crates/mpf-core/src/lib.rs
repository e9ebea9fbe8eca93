//! MPF Core - Multi-Path Finder
//!
//! Runs several independent variational paths against one target and
//! combines their draws by Pareto-smoothed importance resampling:
//! - Dispatches paths on a shared worker pool, isolating failures
//! - Pools the draws of successful paths
//! - Resamples a fixed number of draws from the pooled set
//! - Reports headers, timing and evaluation counts
//!
//! # Example
//!
//! ```rust,ignore
//! use mpf_core::{CsvWriter, MultiPathConfig, MultiPathFinder, NullWriter};
//!
//! let config = MultiPathConfig::new().with_num_paths(8).with_seed(1234);
//! let finder = MultiPathFinder::new(config);
//!
//! let mut params = CsvWriter::new(std::io::stdout().lock());
//! let summary = finder.run(&runner, &model, &inits, &mut params, &mut NullWriter)?;
//! println!("{} of 8 paths succeeded", summary.successful_paths.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod reporter;
pub mod resampler;
pub mod rng;
pub mod weights;
pub mod writer;

// Re-exports for convenience
pub use config::{MultiPathConfig, OptimizerConfig};
pub use error::{error_codes, ConfigError, MultiPathError, OutputError, ResampleError, Sink};
pub use logger::{Logger, NullLogger, TracingLogger};
pub use model::{PathRunner, TargetModel};
pub use orchestrator::{ParallelOrchestrator, PathPhase};
pub use pipeline::{MultiPathFinder, MultiPathSummary};
pub use reporter::{PhaseTimings, Reporter};
pub use resampler::{ImportanceResampler, ResampleDraws};
pub use rng::{create_rng, PathSeed, RESAMPLE_STREAM_TAG};
pub use weights::{ParetoSmoothing, RawImportanceWeights, WeightCorrection};
pub use writer::{CsvWriter, NullWriter, Writer};

pub use mpf_composition::{tail_length, AggregatedSet, CompositionError, ResultAggregator};
pub use mpf_draws::{
    DrawError, PathDraws, PathId, PathOutcome, PathResult, LP_APPROX_NAME, LP_NAME,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for implementing runners and driving runs
    pub use crate::{
        CsvWriter, Logger, MultiPathConfig, MultiPathFinder, NullWriter, OptimizerConfig,
        PathDraws, PathId, PathResult, PathRunner, PathSeed, TargetModel, Writer,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Status code of a run result
#[inline]
#[must_use]
pub fn exit_code<T>(result: &Result<T, MultiPathError>) -> i32 {
    match result {
        Ok(_) => error_codes::OK,
        Err(e) => e.error_code(),
    }
}
