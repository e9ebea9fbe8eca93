//! Leveled plain-text logger
//!
//! The [`Logger`] trait is the user-facing message channel of a run.
//! [`TracingLogger`] forwards to `tracing`.

/// Sink for leveled, human-readable messages
///
/// Shared across worker threads.
pub trait Logger: Send + Sync {
    /// Debug detail
    fn debug(&self, _message: &str) {}

    /// Informational message
    fn info(&self, message: &str);

    /// Warning
    fn warn(&self, message: &str);

    /// Error
    fn error(&self, message: &str);
}

/// Logger that emits `tracing` events under the `mpf` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "mpf", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "mpf", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "mpf", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "mpf", "{message}");
    }
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
