//! Run reporting
//!
//! Writes the header rows, the closing timing block and the informational
//! log lines of a multi-path run.

use crate::error::{OutputError, Sink};
use crate::logger::Logger;
use crate::writer::Writer;
use mpf_draws::{PathId, LP_APPROX_NAME, LP_NAME};
use std::time::Duration;

const TIME_HEADER: &str = "Elapsed Time: ";

/// Wall time of the two timed phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseTimings {
    /// Parallel path phase
    pub paths: Duration,
    /// Aggregation plus importance resampling
    pub resample: Duration,
}

impl PhaseTimings {
    /// Sum of both phases
    #[inline]
    #[must_use]
    pub fn total(&self) -> Duration {
        self.paths + self.resample
    }
}

/// Writes headers, timing and status lines for one run
#[derive(Clone, Copy)]
pub struct Reporter<'a> {
    logger: &'a dyn Logger,
}

impl std::fmt::Debug for Reporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl<'a> Reporter<'a> {
    /// Create reporter logging to `logger`
    #[inline]
    #[must_use]
    pub fn new(logger: &'a dyn Logger) -> Self {
        Self { logger }
    }

    /// Logger used for status lines
    #[inline]
    #[must_use]
    pub fn logger(&self) -> &'a dyn Logger {
        self.logger
    }

    /// Header field names: model parameters, then `lp_approx__`, then `lp__`
    #[must_use]
    pub fn header_names(param_names: Vec<String>) -> Vec<String> {
        let mut names = param_names;
        names.push(LP_APPROX_NAME.to_string());
        names.push(LP_NAME.to_string());
        names
    }

    /// Write the same header row to both sinks
    ///
    /// # Errors
    /// `OutputError` naming the sink that failed
    pub fn write_headers<P, D>(
        &self,
        names: &[String],
        params: &mut P,
        diagnostics: &mut D,
    ) -> Result<(), OutputError>
    where
        P: Writer + ?Sized,
        D: Writer + ?Sized,
    {
        params
            .write_header(names)
            .map_err(|e| OutputError::new(Sink::Parameter, e))?;
        diagnostics
            .write_header(names)
            .map_err(|e| OutputError::new(Sink::Diagnostic, e))
    }

    /// Log a failed path by index
    pub fn path_failed(&self, path_id: PathId, reason: &str) {
        tracing::warn!(path = path_id.0, reason, "path failed");
        self.logger.info(&format!("Path {path_id} failed."));
    }

    /// Log that no path produced draws
    pub fn no_successful_paths(&self) {
        tracing::error!("no paths ran successfully");
        self.logger.info("No paths ran successfully");
    }

    /// Log the total evaluation count unless `refresh` is zero
    pub fn eval_summary(&self, eval_count: u64, refresh: u32) {
        if refresh != 0 {
            self.logger.info(&format!(
                "Total log probability function evaluations: {eval_count}"
            ));
        }
    }

    /// Write the closing timing block to the parameter sink
    ///
    /// # Errors
    /// `OutputError` if the sink fails
    pub fn write_timing<P>(&self, params: &mut P, timings: &PhaseTimings) -> Result<(), OutputError>
    where
        P: Writer + ?Sized,
    {
        let pad = " ".repeat(TIME_HEADER.len());
        let lines = [
            format!("{TIME_HEADER}{} seconds (Paths)", seconds(timings.paths)),
            format!("{pad}{} seconds (PSIS)", seconds(timings.resample)),
            format!("{pad}{} seconds (Total)", seconds(timings.total())),
        ];

        write_block(params, &lines).map_err(|e| OutputError::new(Sink::Parameter, e))
    }
}

fn write_block<P: Writer + ?Sized>(params: &mut P, lines: &[String]) -> std::io::Result<()> {
    params.write_break()?;
    for line in lines {
        params.write_text(line)?;
    }
    params.write_break()
}

/// Seconds at millisecond resolution with six decimals
#[allow(clippy::cast_precision_loss)]
fn seconds(duration: Duration) -> String {
    format!("{:.6}", duration.as_millis() as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NullLogger;
    use crate::writer::CsvWriter;

    #[test]
    fn header_names_append_density_fields() {
        let names = Reporter::header_names(vec!["mu".into(), "sigma".into()]);
        assert_eq!(names, vec!["mu", "sigma", "lp_approx__", "lp__"]);
    }

    #[test]
    fn seconds_truncate_to_millis() {
        assert_eq!(seconds(Duration::from_micros(1_234_567)), "1.234000");
        assert_eq!(seconds(Duration::ZERO), "0.000000");
    }

    #[test]
    fn timing_block_is_aligned() {
        let reporter = Reporter::new(&NullLogger);
        let mut writer = CsvWriter::with_comment_prefix(Vec::new(), "");
        let timings = PhaseTimings {
            paths: Duration::from_millis(1500),
            resample: Duration::from_millis(250),
        };

        reporter.write_timing(&mut writer, &timings).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], " Elapsed Time: 1.500000 seconds (Paths)");
        assert_eq!(lines[2], "               0.250000 seconds (PSIS)");
        assert_eq!(lines[3], "               1.750000 seconds (Total)");
        assert_eq!(lines[4], "");
        assert_eq!(lines[1].find("1.5"), lines[2].find("0.25"));
    }
}
