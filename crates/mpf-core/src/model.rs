//! Collaborator seams for the target model and single-path runs

use crate::config::OptimizerConfig;
use crate::rng::PathSeed;
use mpf_draws::{PathId, PathResult};

/// Target distribution shared by every path
///
/// Workers call into the model concurrently; implementations must be safe
/// for simultaneous read-only density and gradient evaluation.
pub trait TargetModel: Send + Sync {
    /// Model name for log output
    fn name(&self) -> &str;

    /// Names of the constrained parameters, in sample-row order
    fn constrained_param_names(&self) -> Vec<String>;
}

/// Runs one variational path against a model
///
/// # Contract
/// - Deterministic for a fixed `(seed, path_id)`
/// - Reports failure through [`PathResult`], never by panicking
/// - Sample matrices carry the constrained parameters followed by
///   `lp_approx__` and `lp__`
pub trait PathRunner: Send + Sync {
    /// Model type this runner evaluates
    type Model: TargetModel + ?Sized;

    /// Per-path initialization context
    type Init: Sync;

    /// Execute a single path
    fn run_path(
        &self,
        model: &Self::Model,
        init: &Self::Init,
        seed: PathSeed,
        path_id: PathId,
        config: &OptimizerConfig,
    ) -> PathResult;
}
