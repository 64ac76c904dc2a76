//! Error types for fanhash
//!
//! This module defines the error taxonomy shared by the digest primitives,
//! the pipelines and the fan-out engine, including the aggregate error that
//! carries one failure per pipeline slot.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Main error type for fanhash operations
#[derive(Error, Debug)]
pub enum FanHashError {
    /// Algorithm code not in the supported set
    #[error("Unknown algorithm code '{0}' (expected one of: c, m, s)")]
    UnknownAlgorithm(char),

    /// Pipeline specification with no stages
    #[error("Pipeline specification is empty")]
    EmptyPipeline,

    /// No pipelines were configured
    #[error("No pipelines configured")]
    NoPipelines,

    /// Other configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while a pipeline consumed its input stream
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// The shared input source failed while being broadcast
    #[error("Failed to read input source: {0}")]
    SourceRead(String),

    /// A pipeline failed on its own
    #[error("Pipeline failure: {0}")]
    Worker(String),

    /// A worker did not finish after the input was closed
    #[error("Worker timed out {0:?} after end of input")]
    Timeout(Duration),

    /// One or more pipelines failed during a fan-out run
    #[error(transparent)]
    FanOut(#[from] FanOutError),
}

impl FanHashError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a pipeline failure
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker(message.into())
    }

    /// Check if this error comes from invalid configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownAlgorithm(_) | Self::EmptyPipeline | Self::NoPipelines | Self::Config(_)
        )
    }

    /// Check if this error is a post-close timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<std::io::Error> for FanHashError {
    fn from(err: std::io::Error) -> Self {
        FanHashError::Io { source: err }
    }
}

/// Result type alias for fanhash operations
pub type Result<T> = std::result::Result<T, FanHashError>;

/// Failure of a single pipeline slot
#[derive(Debug)]
pub struct PipelineFailure {
    /// Position of the pipeline in the declared order
    pub index: usize,
    /// Label of the pipeline, e.g. `cm`
    pub pipeline: String,
    /// What went wrong
    pub error: FanHashError,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipeline #{} ({}): {}", self.index, self.pipeline, self.error)
    }
}

/// Aggregate failure of a fan-out run
///
/// Holds one entry per failed pipeline, ordered by declaration index.
/// Pipelines that succeeded contribute nothing.
#[derive(Debug)]
pub struct FanOutError {
    failures: Vec<PipelineFailure>,
}

impl FanOutError {
    /// Build from a list of failures; entries are sorted by index
    pub fn new(mut failures: Vec<PipelineFailure>) -> Self {
        failures.sort_by_key(|f| f.index);
        Self { failures }
    }

    /// Failures in declaration order
    pub fn failures(&self) -> &[PipelineFailure] {
        &self.failures
    }

    /// Consume into the failure list
    pub fn into_failures(self) -> Vec<PipelineFailure> {
        self.failures
    }

    /// Number of failed pipelines
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// True when no failure was recorded
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for FanOutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pipeline(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for FanOutError {}

/// Collects per-pipeline outcomes into an all-or-nothing result
///
/// Each entry is `(label, outcome)` in declaration order. Either every
/// outcome succeeded and the values come back in order, or every failure is
/// returned inside a [`FanOutError`].
pub fn collect_outcomes<T>(outcomes: Vec<(String, Result<T>)>) -> Result<Vec<T>> {
    let mut successes = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for (index, (pipeline, outcome)) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => successes.push(value),
            Err(error) => failures.push(PipelineFailure { index, pipeline, error }),
        }
    }

    if failures.is_empty() {
        Ok(successes)
    } else {
        Err(FanOutError::new(failures).into())
    }
}
