//! Gaussian demo target and runner
//!
//! [`GaussianTarget`] is an isotropic unit normal centred at `(0, 1, 2, ...)`.
//! [`GaussianPathRunner`] climbs to the mode by gradient ascent and then
//! draws from a widened normal around it, so every path yields a proper
//! approximation with non-trivial importance ratios.

use mpf_core::{OptimizerConfig, PathDraws, PathId, PathResult, PathRunner, PathSeed, TargetModel};
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Gradient ascent step on the log density
const ASCENT_STEP: f64 = 0.5;

/// Isotropic Gaussian with mean `i` in dimension `i`
#[derive(Debug, Clone)]
pub struct GaussianTarget {
    means: Vec<f64>,
    names: Vec<String>,
}

impl GaussianTarget {
    /// Target with `dims` dimensions
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(dims: usize) -> Self {
        Self {
            means: (0..dims).map(|i| i as f64).collect(),
            names: (0..dims).map(|i| format!("theta.{}", i + 1)).collect(),
        }
    }

    /// Number of dimensions
    #[inline]
    #[must_use]
    pub fn dims(&self) -> usize {
        self.means.len()
    }

    /// Mean of each dimension
    #[inline]
    #[must_use]
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Unnormalized log density
    #[must_use]
    pub fn log_density(&self, theta: &[f64]) -> f64 {
        -0.5 * theta
            .iter()
            .zip(&self.means)
            .map(|(x, m)| (x - m) * (x - m))
            .sum::<f64>()
    }

    fn gradient(&self, theta: &[f64], out: &mut [f64]) {
        for ((g, x), m) in out.iter_mut().zip(theta).zip(&self.means) {
            *g = m - x;
        }
    }
}

impl TargetModel for GaussianTarget {
    fn name(&self) -> &str {
        "gaussian"
    }

    fn constrained_param_names(&self) -> Vec<String> {
        self.names.clone()
    }
}

/// Mode-finding runner with a normal approximation of fixed width
#[derive(Debug, Clone, Copy)]
pub struct GaussianPathRunner {
    scale: f64,
}

impl Default for GaussianPathRunner {
    fn default() -> Self {
        Self { scale: 1.2 }
    }
}

impl GaussianPathRunner {
    /// Runner whose approximation has standard deviation `scale`
    #[inline]
    #[must_use]
    pub fn with_scale(scale: f64) -> Self {
        Self { scale }
    }

    fn find_mode<R: Rng>(
        &self,
        model: &GaussianTarget,
        init: Option<&[f64]>,
        rng: &mut R,
        config: &OptimizerConfig,
    ) -> Result<(Vec<f64>, u64), String> {
        let dims = model.dims();
        let mut theta = match init {
            Some(values) if values.len() != dims => {
                return Err(format!(
                    "init has {} values but the model has {dims} parameters",
                    values.len()
                ));
            }
            Some(values) => values.to_vec(),
            None if config.init_radius > 0.0 => (0..dims)
                .map(|_| rng.gen_range(-config.init_radius..config.init_radius))
                .collect(),
            None => vec![0.0; dims],
        };

        let mut grad = vec![0.0; dims];
        let mut evals = 0;
        for _ in 0..config.num_iterations {
            model.gradient(&theta, &mut grad);
            evals += 1;
            let norm = grad.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if !norm.is_finite() {
                return Err("gradient is not finite".to_string());
            }
            if norm <= config.tol_grad {
                break;
            }
            for (x, g) in theta.iter_mut().zip(&grad) {
                *x += ASCENT_STEP * g;
            }
        }
        Ok((theta, evals))
    }
}

impl PathRunner for GaussianPathRunner {
    type Model = GaussianTarget;
    type Init = Option<Vec<f64>>;

    fn run_path(
        &self,
        model: &GaussianTarget,
        init: &Option<Vec<f64>>,
        seed: PathSeed,
        path_id: PathId,
        config: &OptimizerConfig,
    ) -> PathResult {
        let mut rng = seed.rng();
        let (mode, mut evals) = match self.find_mode(model, init.as_deref(), &mut rng, config) {
            Ok(found) => found,
            Err(reason) => return PathResult::failure(path_id, reason, 0),
        };

        let dims = model.dims();
        let log_scale = self.scale.ln();
        let mut samples = Array2::<f64>::zeros((dims + 2, config.num_draws));
        let mut theta = vec![0.0; dims];
        for mut column in samples.columns_mut() {
            let mut log_q = 0.0;
            for (d, x) in theta.iter_mut().enumerate() {
                let z: f64 = StandardNormal.sample(&mut rng);
                *x = mode[d] + self.scale * z;
                column[d] = *x;
                log_q += -0.5 * z * z - log_scale;
            }
            column[dims] = log_q;
            column[dims + 1] = model.log_density(&theta);
            evals += 1;
        }

        tracing::debug!(path = path_id.0, evals, "gaussian path finished");
        match PathDraws::from_samples(samples) {
            Ok(draws) => PathResult::success(path_id, draws, evals),
            Err(e) => PathResult::failure(path_id, e.to_string(), evals),
        }
    }
}
