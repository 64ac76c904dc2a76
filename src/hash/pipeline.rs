//! Chained hash pipelines
//!
//! A [`Pipeline`] is an ordered list of algorithms. The first stage
//! consumes the input; every later stage hashes the bytes produced by the
//! stage before it.

use super::digest::{compute_bytes, compute_reader, HashResult};
use crate::config::{HashAlgorithm, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
use crate::error::{FanHashError, Result};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;

/// Something a fan-out worker can run over its share of the input
///
/// [`Pipeline`] is the production implementation.
pub trait StreamHash: Send + Sync {
    /// Short label used in failure reports
    fn label(&self) -> String;

    /// Hash a stream until EOF
    fn hash_stream(&self, input: &mut dyn Read) -> Result<HashResult>;

    /// Hash an in-memory buffer
    fn hash_bytes(&self, input: &[u8]) -> Result<HashResult>;
}

/// Ordered, non-empty sequence of hash algorithms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<HashAlgorithm>,
    buffer_size: usize,
}

impl Pipeline {
    /// Build from explicit stages
    pub fn new(stages: Vec<HashAlgorithm>) -> Result<Self> {
        if stages.is_empty() {
            return Err(FanHashError::EmptyPipeline);
        }
        Ok(Self {
            stages,
            buffer_size: DEFAULT_BUFFER_SIZE,
        })
    }

    /// Single-stage pipeline
    pub fn single(algorithm: HashAlgorithm) -> Self {
        Self {
            stages: vec![algorithm],
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Build from algorithm codes, e.g. `"cm"` for CRC32 then MD5
    pub fn parse(spec: &str) -> Result<Self> {
        let stages = spec
            .trim()
            .chars()
            .map(|code| HashAlgorithm::from_code(code).ok_or(FanHashError::UnknownAlgorithm(code)))
            .collect::<Result<Vec<_>>>()?;

        Self::new(stages)
    }

    /// Set the chunk size used when the first stage reads a stream
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Result<Self> {
        if buffer_size == 0 {
            return Err(FanHashError::config("buffer size must be at least 1 byte"));
        }
        if buffer_size > MAX_BUFFER_SIZE {
            return Err(FanHashError::config(format!(
                "buffer size {} exceeds the {} byte limit",
                buffer_size, MAX_BUFFER_SIZE
            )));
        }
        self.buffer_size = buffer_size;
        Ok(self)
    }

    /// Stages in application order
    pub fn stages(&self) -> &[HashAlgorithm] {
        &self.stages
    }

    /// Chunk size for stream input
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Size of the final output in bytes
    pub fn output_size(&self) -> usize {
        self.stages.last().map_or(0, |a| a.output_size())
    }

    /// Hash a stream: the first stage reads it, the rest fold over its output
    pub fn apply_reader(&self, input: &mut dyn Read) -> Result<HashResult> {
        let (first, rest) = self.split();
        let head = compute_reader(first, input, self.buffer_size)?;
        Ok(self.fold(head, rest))
    }

    /// Hash an in-memory buffer
    pub fn apply_bytes(&self, input: &[u8]) -> HashResult {
        let (first, rest) = self.split();
        self.fold(compute_bytes(first, input), rest)
    }

    /// Hash the UTF-8 bytes of a string
    pub fn apply_str(&self, input: &str) -> HashResult {
        self.apply_bytes(input.as_bytes())
    }

    fn split(&self) -> (HashAlgorithm, &[HashAlgorithm]) {
        // stages is non-empty by construction
        let (first, rest) = self.stages.split_at(1);
        (first[0], rest)
    }

    fn fold(&self, head: HashResult, rest: &[HashAlgorithm]) -> HashResult {
        rest.iter()
            .fold(head, |acc, &algorithm| compute_bytes(algorithm, acc.as_bytes()))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in &self.stages {
            write!(f, "{}", stage.code())?;
        }
        Ok(())
    }
}

impl FromStr for Pipeline {
    type Err = FanHashError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl StreamHash for Pipeline {
    fn label(&self) -> String {
        self.to_string()
    }

    fn hash_stream(&self, input: &mut dyn Read) -> Result<HashResult> {
        self.apply_reader(input)
    }

    fn hash_bytes(&self, input: &[u8]) -> Result<HashResult> {
        Ok(self.apply_bytes(input))
    }
}

/// Build the ordered pipeline list the engine consumes
pub fn parse_pipelines<S: AsRef<str>>(specs: &[S], buffer_size: usize) -> Result<Vec<Arc<dyn StreamHash>>> {
    if specs.is_empty() {
        return Err(FanHashError::NoPipelines);
    }

    specs
        .iter()
        .map(|spec| {
            let pipeline = Pipeline::parse(spec.as_ref())?.with_buffer_size(buffer_size)?;
            Ok(Arc::new(pipeline) as Arc<dyn StreamHash>)
        })
        .collect()
}
