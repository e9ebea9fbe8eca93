//! Testing utilities for MPF workspace
//!
//! Shared test helpers, fixtures, and recording sinks.

#![allow(missing_docs)]

use mpf_core::{Logger, OptimizerConfig, PathRunner, PathSeed, TargetModel, Writer};
use mpf_draws::{PathDraws, PathId, PathResult};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use rand::Rng;
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone)]
pub struct StubModel {
    pub names: Vec<String>,
}

impl StubModel {
    pub fn with_params(count: usize) -> Self {
        Self {
            names: (0..count).map(|i| format!("theta.{}", i + 1)).collect(),
        }
    }
}

impl TargetModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    fn constrained_param_names(&self) -> Vec<String> {
        self.names.clone()
    }
}

/// What a scripted path does
#[derive(Debug, Clone, PartialEq)]
pub enum PathPlan {
    /// Produce `draws` random draws, reporting `evals` evaluations
    Succeed { draws: usize, evals: u64 },
    /// Produce draws with the given log ratios
    Ratios { ratios: Vec<f64>, evals: u64 },
    /// Produce draws with a non-default parameter count
    WrongDims { params: usize, draws: usize },
    /// Fail after `evals` evaluations
    Fail { evals: u64 },
    /// Panic inside the runner
    Panic,
}

/// Runner that follows a per-path script and records the seeds it saw
#[derive(Debug)]
pub struct ScriptedRunner {
    params: usize,
    default_plan: PathPlan,
    plans: BTreeMap<u32, PathPlan>,
    seen: Mutex<Vec<(PathId, PathSeed)>>,
}

impl ScriptedRunner {
    /// Every path succeeds with `draws` draws of `params` parameters
    pub fn succeeding(params: usize, draws: usize) -> Self {
        Self {
            params,
            default_plan: PathPlan::Succeed { draws, evals: 10 },
            plans: BTreeMap::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Every path fails
    pub fn failing(params: usize) -> Self {
        Self {
            params,
            default_plan: PathPlan::Fail { evals: 0 },
            plans: BTreeMap::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Override the plan of one path
    pub fn with_plan(mut self, path: u32, plan: PathPlan) -> Self {
        self.plans.insert(path, plan);
        self
    }

    /// Seeds received so far, sorted by path id
    pub fn seen(&self) -> Vec<(PathId, PathSeed)> {
        let mut seen = self.seen.lock().clone();
        seen.sort_by_key(|(id, _)| *id);
        seen
    }

    fn plan(&self, path_id: PathId) -> &PathPlan {
        self.plans.get(&path_id.0).unwrap_or(&self.default_plan)
    }
}

impl PathRunner for ScriptedRunner {
    type Model = StubModel;
    type Init = ();

    fn run_path(
        &self,
        _model: &StubModel,
        _init: &(),
        seed: PathSeed,
        path_id: PathId,
        _config: &OptimizerConfig,
    ) -> PathResult {
        self.seen.lock().push((path_id, seed));

        match self.plan(path_id).clone() {
            PathPlan::Succeed { draws, evals } => {
                let samples = random_samples(seed, self.params, draws);
                PathResult::success(path_id, PathDraws::from_samples(samples).unwrap(), evals)
            }
            PathPlan::Ratios { ratios, evals } => {
                let samples = random_samples(seed, self.params, ratios.len());
                let draws = PathDraws::new(Array1::from(ratios), samples).unwrap();
                PathResult::success(path_id, draws, evals)
            }
            PathPlan::WrongDims { params, draws } => {
                let samples = random_samples(seed, params, draws);
                PathResult::success(path_id, PathDraws::from_samples(samples).unwrap(), 1)
            }
            PathPlan::Fail { evals } => PathResult::failure(path_id, "scripted failure", evals),
            PathPlan::Panic => panic!("scripted panic on path {path_id}"),
        }
    }
}

/// Samples whose parameters encode the stream, plus plausible density rows
pub fn random_samples(seed: PathSeed, params: usize, draws: usize) -> Array2<f64> {
    let mut rng = seed.rng();
    let mut samples = Array2::<f64>::zeros((params + 2, draws));
    for c in 0..draws {
        let mut sq = 0.0;
        for r in 0..params {
            let v: f64 = rng.gen_range(-1.0..1.0);
            samples[[r, c]] = v;
            sq += v * v;
        }
        samples[[params, c]] = -0.5 * sq + rng.gen_range(-0.1..0.1);
        samples[[params + 1, c]] = -0.5 * sq;
    }
    samples
}

/// One call received by a [`RecordingWriter`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriterRecord {
    Header(Vec<String>),
    Row(Vec<f64>),
    Break,
    Text(String),
}

/// Writer that keeps every call in order
#[derive(Debug, Default)]
pub struct RecordingWriter {
    pub records: Vec<WriterRecord>,
    fail: bool,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer whose every call fails
    pub fn broken() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }

    pub fn headers(&self) -> Vec<&Vec<String>> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WriterRecord::Header(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    pub fn rows(&self) -> Vec<&Vec<f64>> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WriterRecord::Row(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match r {
                WriterRecord::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, record: WriterRecord) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
        }
        self.records.push(record);
        Ok(())
    }
}

impl Writer for RecordingWriter {
    fn write_header(&mut self, names: &[String]) -> io::Result<()> {
        self.record(WriterRecord::Header(names.to_vec()))
    }

    fn write_row(&mut self, values: &[f64]) -> io::Result<()> {
        self.record(WriterRecord::Row(values.to_vec()))
    }

    fn write_break(&mut self) -> io::Result<()> {
        self.record(WriterRecord::Break)
    }

    fn write_text(&mut self, line: &str) -> io::Result<()> {
        self.record(WriterRecord::Text(line.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Logger that keeps every message
#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.lines.lock().push((LogLevel::Debug, message.to_string()));
    }

    fn info(&self, message: &str) {
        self.lines.lock().push((LogLevel::Info, message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.lines.lock().push((LogLevel::Warn, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.lines.lock().push((LogLevel::Error, message.to_string()));
    }
}

/// `count` unit init contexts
pub fn unit_inits(count: usize) -> Vec<()> {
    vec![(); count]
}
