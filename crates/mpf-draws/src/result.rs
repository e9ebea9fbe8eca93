//! Path outcome types

use crate::draws::PathDraws;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a path within one multi-path run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathId(pub u32);

impl PathId {
    /// Position of this path in per-path arrays
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a path produced usable draws
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    /// Path finished with draws
    Success(PathDraws),
    /// Path failed; draws are discarded
    Failure {
        /// Human-readable cause
        reason: String,
    },
}

/// Everything a path runner reports back
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Path that produced this result
    pub path_id: PathId,
    /// Success or failure
    pub outcome: PathOutcome,
    /// Log density evaluations spent, partial for failed paths
    pub eval_count: u64,
}

impl PathResult {
    /// Successful result
    #[inline]
    #[must_use]
    pub fn success(path_id: PathId, draws: PathDraws, eval_count: u64) -> Self {
        Self {
            path_id,
            outcome: PathOutcome::Success(draws),
            eval_count,
        }
    }

    /// Failed result
    #[inline]
    #[must_use]
    pub fn failure(path_id: PathId, reason: impl Into<String>, eval_count: u64) -> Self {
        Self {
            path_id,
            outcome: PathOutcome::Failure {
                reason: reason.into(),
            },
            eval_count,
        }
    }

    /// Check if the path succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PathOutcome::Success(_))
    }

    /// Draws of a successful path
    #[inline]
    #[must_use]
    pub fn draws(&self) -> Option<&PathDraws> {
        match &self.outcome {
            PathOutcome::Success(draws) => Some(draws),
            PathOutcome::Failure { .. } => None,
        }
    }

    /// Take the draws of a successful path
    #[inline]
    #[must_use]
    pub fn into_draws(self) -> Option<PathDraws> {
        match self.outcome {
            PathOutcome::Success(draws) => Some(draws),
            PathOutcome::Failure { .. } => None,
        }
    }
}
