//! Error types for MPF Core
//!
//! Every failure that can end a multi-path run is a [`MultiPathError`]
//! and maps onto one of the fixed process codes in [`error_codes`].

use mpf_composition::CompositionError;
use std::path::PathBuf;

/// Fixed status codes reported by a multi-path run
pub mod error_codes {
    /// Run completed
    pub const OK: i32 = 0;
    /// Command line usage error
    pub const USAGE: i32 = 64;
    /// Path draws disagree in shape
    pub const DATAERR: i32 = 65;
    /// Internal failure, including zero successful paths
    pub const SOFTWARE: i32 = 70;
    /// Output could not be written
    pub const IOERR: i32 = 74;
    /// Configuration error
    pub const CONFIG: i32 = 78;
}

/// Main multi-path error type
#[derive(Debug, thiserror::Error)]
pub enum MultiPathError {
    /// Configuration rejected before any output was written
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Every path failed
    #[error("no paths ran successfully")]
    NoSuccessfulPaths,

    /// Path draws could not be combined
    #[error("composition failed: {0}")]
    Composition(CompositionError),

    /// Importance resampling failed
    #[error("resampling failed: {0}")]
    Resample(#[from] ResampleError),

    /// An output sink failed
    #[error("output failed: {0}")]
    Output(#[from] OutputError),

    /// Worker pool could not be created
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

impl MultiPathError {
    /// Status code for this failure
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> i32 {
        match self {
            Self::Config(_) => error_codes::CONFIG,
            Self::Output(_) => error_codes::IOERR,
            Self::Composition(CompositionError::DimensionMismatch { .. }) => error_codes::DATAERR,
            Self::NoSuccessfulPaths
            | Self::Composition(_)
            | Self::Resample(_)
            | Self::WorkerPool(_) => error_codes::SOFTWARE,
        }
    }
}

impl From<CompositionError> for MultiPathError {
    fn from(err: CompositionError) -> Self {
        match err {
            CompositionError::NoSuccessfulPaths => Self::NoSuccessfulPaths,
            other => Self::Composition(other),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field holds an unusable value
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// Fewer init contexts than paths
    #[error("expected at least {expected} init contexts, got {found}")]
    InitCountMismatch {
        /// Number of paths requested
        expected: usize,
        /// Number of init contexts supplied
        found: usize,
    },

    /// Config file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Create an invalid value error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Importance resampling errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResampleError {
    /// Weights sum to zero
    #[error("all importance weights are zero")]
    DegenerateWeights,

    /// A weight is negative or not finite
    #[error("invalid importance weight {value} at index {index}")]
    InvalidWeight {
        /// Position of the weight
        index: usize,
        /// Offending value
        value: f64,
    },

    /// More weights than the categorical sampler can index
    #[error("{len} weights exceed the sampler's index range")]
    TooManyWeights {
        /// Number of weights
        len: usize,
    },

    /// Weight count differs from the number of draws
    #[error("{weights} weights for {draws} draws")]
    LengthMismatch {
        /// Number of weights
        weights: usize,
        /// Number of aggregated draws
        draws: usize,
    },
}

/// Output sink errors
#[derive(Debug, thiserror::Error)]
#[error("{sink} writer failed: {source}")]
pub struct OutputError {
    /// Which sink failed
    pub sink: Sink,
    /// Underlying error
    #[source]
    pub source: std::io::Error,
}

impl OutputError {
    /// Wrap an I/O error from `sink`
    #[inline]
    #[must_use]
    pub fn new(sink: Sink, source: std::io::Error) -> Self {
        Self { sink, source }
    }
}

/// Output sink identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Parameter draws
    Parameter,
    /// Diagnostics
    Diagnostic,
}

impl std::fmt::Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parameter => f.write_str("parameter"),
            Self::Diagnostic => f.write_str("diagnostic"),
        }
    }
}
