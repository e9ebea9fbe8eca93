//! Run configuration
//!
//! [`MultiPathConfig`] drives the orchestration layer; the embedded
//! [`OptimizerConfig`] is handed to every path runner untouched.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings forwarded unmodified to each path runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Random inits are drawn uniformly from `(-init_radius, init_radius)`
    pub init_radius: f64,
    /// L-BFGS history size
    pub history_size: usize,
    /// Line search step size for the first iteration
    pub init_alpha: f64,
    /// Absolute objective tolerance
    pub tol_obj: f64,
    /// Relative objective tolerance
    pub tol_rel_obj: f64,
    /// Gradient norm tolerance
    pub tol_grad: f64,
    /// Relative gradient norm tolerance
    pub tol_rel_grad: f64,
    /// Parameter change tolerance
    pub tol_param: f64,
    /// Maximum optimizer iterations
    pub num_iterations: usize,
    /// Write every iteration to the per-path writer
    pub save_iterations: bool,
    /// Progress logging interval; zero disables progress output
    pub refresh: u32,
    /// Monte Carlo draws per ELBO estimate
    pub num_elbo_draws: usize,
    /// Approximate draws returned by each path
    pub num_draws: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            init_radius: 2.0,
            history_size: 5,
            init_alpha: 0.001,
            tol_obj: 1e-12,
            tol_rel_obj: 1e4,
            tol_grad: 1e-8,
            tol_rel_grad: 1e7,
            tol_param: 1e-8,
            num_iterations: 1000,
            save_iterations: false,
            refresh: 100,
            num_elbo_draws: 25,
            num_draws: 1000,
        }
    }
}

impl OptimizerConfig {
    /// Check every field is usable
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("init_radius", self.init_radius),
            ("tol_obj", self.tol_obj),
            ("tol_rel_obj", self.tol_rel_obj),
            ("tol_grad", self.tol_grad),
            ("tol_rel_grad", self.tol_rel_grad),
            ("tol_param", self.tol_param),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        if !self.init_alpha.is_finite() || self.init_alpha <= 0.0 {
            return Err(ConfigError::invalid(
                "init_alpha",
                format!("must be finite and positive, got {}", self.init_alpha),
            ));
        }
        if self.history_size == 0 {
            return Err(ConfigError::invalid("history_size", "must be positive"));
        }
        if self.num_elbo_draws == 0 {
            return Err(ConfigError::invalid("num_elbo_draws", "must be positive"));
        }
        if self.num_draws == 0 {
            return Err(ConfigError::invalid("num_draws", "must be positive"));
        }
        Ok(())
    }
}

/// Multi-path run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MultiPathConfig {
    /// Base seed shared by every RNG stream of the run
    pub random_seed: u64,
    /// Stream offset; path `i` uses stream `path + i`
    pub path: u32,
    /// Number of independent paths
    pub num_paths: u32,
    /// Draws returned after importance resampling
    pub num_multi_draws: usize,
    /// Worker pool size; `None` uses the global pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,
    /// Settings forwarded to each path
    pub optimizer: OptimizerConfig,
}

impl Default for MultiPathConfig {
    fn default() -> Self {
        Self {
            random_seed: 0,
            path: 0,
            num_paths: 4,
            num_multi_draws: 1000,
            num_threads: None,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl MultiPathConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With random seed
    #[inline]
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// With stream offset
    #[inline]
    #[must_use]
    pub fn with_path_offset(mut self, path: u32) -> Self {
        self.path = path;
        self
    }

    /// With number of paths
    #[inline]
    #[must_use]
    pub fn with_num_paths(mut self, num_paths: u32) -> Self {
        self.num_paths = num_paths;
        self
    }

    /// With number of combined draws
    #[inline]
    #[must_use]
    pub fn with_num_multi_draws(mut self, num_multi_draws: usize) -> Self {
        self.num_multi_draws = num_multi_draws;
        self
    }

    /// With per-path draw count
    #[inline]
    #[must_use]
    pub fn with_num_draws(mut self, num_draws: usize) -> Self {
        self.optimizer.num_draws = num_draws;
        self
    }

    /// With progress interval
    #[inline]
    #[must_use]
    pub fn with_refresh(mut self, refresh: u32) -> Self {
        self.optimizer.refresh = refresh;
        self
    }

    /// With dedicated worker pool size
    #[inline]
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// With optimizer settings
    #[inline]
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Progress interval; zero suppresses progress logging
    #[inline]
    #[must_use]
    pub fn refresh(&self) -> u32 {
        self.optimizer.refresh
    }

    /// Check the configuration before any work starts
    ///
    /// # Errors
    /// `ConfigError::InvalidValue` naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_paths == 0 {
            return Err(ConfigError::invalid("num_paths", "must be positive"));
        }
        if self.num_threads == Some(0) {
            return Err(ConfigError::invalid("num_threads", "must be positive"));
        }
        self.optimizer.validate()
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed input or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, `ConfigError::Parse`
    /// if it is not valid
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// `ConfigError::Serialize` if rendering fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
