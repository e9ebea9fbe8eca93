//! MPF CLI - command-line driver for multi-path runs
//!
//! Ships a self-contained Gaussian target and runner so the pipeline can be
//! exercised end to end without an external model.

pub mod demo;

pub use demo::{GaussianPathRunner, GaussianTarget};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
