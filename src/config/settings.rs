//! Configuration settings for fanhash
//!
//! Defines the CLI arguments, the supported hash algorithms, and the
//! tuning knobs of the fan-out engine.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Default read chunk size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Default number of chunks a worker queue can hold
pub const DEFAULT_QUEUE_DEPTH: usize = 16;

/// Largest accepted read chunk size
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Largest accepted per-worker queue depth
pub const MAX_QUEUE_DEPTH: usize = 65_536;

/// Default time a worker gets to finish after end of input
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(1);

/// fanhash - compute several chained hashes over one read of the input
#[derive(Parser, Debug, Clone)]
#[command(name = "fanhash")]
#[command(author = "fanhash Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Computes various hashes against the given input data")]
#[command(long_about = r#"
Computes various hashes against the given input data. Input data can come
from filenames on the command line, literal strings, or stdin.

Each encoding is a sequence of algorithm codes applied left to right:
  c: crc32
  m: md5
  s: sha1

Examples:
  fanhash -e m -e s file.bin         # MD5 and SHA-1 of a file
  fanhash -e cm -s foobar            # CRC32 of "foobar", then MD5 of that
  cat file.bin | fanhash -e c,m,s    # three hashes over stdin
  fanhash -l                         # print the license
"#)]
pub struct CliArgs {
    /// Input files (stdin is read when no files or strings are given)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Sequence of encodings to apply (c: crc32, m: md5, s: sha1)
    #[arg(
        short = 'e',
        long = "encoding",
        value_name = "SPEC",
        value_delimiter = ',',
        required_unless_present = "license"
    )]
    pub encodings: Vec<String>,

    /// Encode the given string
    #[arg(short = 's', long = "string", value_name = "STRING")]
    pub strings: Vec<String>,

    /// Read chunk size (e.g., 1K, 64K)
    #[arg(short = 'b', long, default_value = "1K", value_name = "SIZE")]
    pub buffer_size: String,

    /// Number of chunks buffered per pipeline
    #[arg(long, default_value_t = DEFAULT_QUEUE_DEPTH, value_name = "NUM")]
    pub queue_depth: usize,

    /// Time each pipeline gets to finish after end of input (e.g., 1s, 500ms)
    #[arg(long, default_value = "1s", value_name = "DURATION")]
    pub timeout: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress log output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Display the license this software is released under
    #[arg(short = 'l', long)]
    pub license: bool,
}

/// Hash algorithm usable as a pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// CRC-32 (IEEE), 4 bytes big-endian
    Crc32,
    /// MD5, 16 bytes
    Md5,
    /// SHA-1, 20 bytes
    Sha1,
}

impl HashAlgorithm {
    /// All supported algorithms
    pub const ALL: [HashAlgorithm; 3] = [Self::Crc32, Self::Md5, Self::Sha1];

    /// Look up an algorithm by its one-letter code
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'c' => Some(Self::Crc32),
            'm' => Some(Self::Md5),
            's' => Some(Self::Sha1),
            _ => None,
        }
    }

    /// One-letter configuration code
    pub fn code(&self) -> char {
        match self {
            Self::Crc32 => 'c',
            Self::Md5 => 'm',
            Self::Sha1 => 's',
        }
    }

    /// Get the output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Self::Crc32 => 4,
            Self::Md5 => 16,
            Self::Sha1 => 20,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crc32 => "CRC32",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
        }
    }
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `label: hex hex ...` lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Tuning for the fan-out engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Size of each chunk read from the source
    pub buffer_size: usize,
    /// Chunks buffered per worker before the reader blocks
    pub queue_depth: usize,
    /// Time each worker gets to finish, counted from end of input
    pub worker_timeout: Duration,
    /// Time a cancelled worker gets to acknowledge before it is abandoned
    pub cancel_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
            cancel_grace: DEFAULT_WORKER_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Set the chunk size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Set the per-worker queue depth
    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    /// Set the post-close worker timeout
    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }

    /// Set the grace period for cancelled workers
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_size == 0 {
            return Err("buffer size must be at least 1 byte".to_string());
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            return Err(format!(
                "buffer size {} exceeds the {} byte limit",
                self.buffer_size, MAX_BUFFER_SIZE
            ));
        }
        if self.queue_depth == 0 {
            return Err("queue depth must be at least 1".to_string());
        }
        if self.queue_depth > MAX_QUEUE_DEPTH {
            return Err(format!(
                "queue depth {} exceeds the limit of {}",
                self.queue_depth, MAX_QUEUE_DEPTH
            ));
        }
        Ok(())
    }

    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let buffer_size = parse_size(&args.buffer_size)
            .map_err(|e| format!("Invalid buffer size: {}", e))
            .and_then(|n| usize::try_from(n).map_err(|_| format!("Invalid buffer size: {} is too large", n)))?;
        let worker_timeout = humantime::parse_duration(&args.timeout)
            .map_err(|e| format!("Invalid timeout '{}': {}", args.timeout, e))?;

        let config = Self::default()
            .with_buffer_size(buffer_size)
            .with_queue_depth(args.queue_depth)
            .with_worker_timeout(worker_timeout)
            .with_cancel_grace(worker_timeout);

        config.validate()?;
        Ok(config)
    }
}

/// Parse a chunk size such as `512`, `4K`, `1.5KB` or `2M` into bytes
///
/// Units are binary (`K` = 1024). Fractional byte counts are truncated;
/// signs, exponents and values past `u64::MAX` are rejected.
pub fn parse_size(size: &str) -> Result<u64, String> {
    let text = size.trim();
    if text.is_empty() {
        return Err("Empty size string".to_string());
    }

    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (digits, unit) = text.split_at(split);

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        other => return Err(format!("Unknown size unit '{}' in '{}'", other, text)),
    };

    if digits.is_empty() {
        return Err(format!("Missing number in '{}'", text));
    }

    match digits.split_once('.') {
        None => digits
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .ok_or_else(|| format!("Size '{}' is out of range", text)),
        Some(_) => {
            let value: f64 = digits
                .parse()
                .map_err(|_| format!("Invalid number '{}'", digits))?;
            let bytes = value * multiplier as f64;
            if !bytes.is_finite() || bytes >= u64::MAX as f64 {
                return Err(format!("Size '{}' is out of range", text));
            }
            Ok(bytes as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1024").unwrap(), 1024);
        assert_eq!(parse_size("1K").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("64k").unwrap(), 64 * 1024);
        assert_eq!(parse_size("1M").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("16B").unwrap(), 16);
        assert_eq!(parse_size(" 2 kb ").unwrap(), 2048);
        assert_eq!(parse_size("1.5K").unwrap(), 1536);
        assert!(parse_size("").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("K").is_err());
        assert!(parse_size("4G").is_err());
    }

    #[test]
    fn test_parse_size_rejects_unbounded_values() {
        for input in ["inf", "infinity", "NaN", "-1K", "-0", "1e400", "1.2.3"] {
            assert!(parse_size(input).is_err(), "{} should be rejected", input);
        }
        assert!(parse_size("18446744073709551615K").is_err());
        assert!(parse_size("99999999999999999999").is_err());
    }

    #[test]
    fn test_engine_config_rejects_oversized_values() {
        for size in ["inf", "1e30", "100M"] {
            let args = CliArgs::parse_from(["fanhash", "-e", "m", "-b", size]);
            assert!(EngineConfig::from_cli(&args).is_err(), "-b {} should be rejected", size);
        }

        let args = CliArgs::parse_from(["fanhash", "-e", "m", "--queue-depth", "1000000000"]);
        assert!(EngineConfig::from_cli(&args).is_err());

        let at_limit = EngineConfig::default()
            .with_buffer_size(MAX_BUFFER_SIZE)
            .with_queue_depth(MAX_QUEUE_DEPTH);
        assert!(at_limit.validate().is_ok());
        assert!(at_limit.clone().with_buffer_size(MAX_BUFFER_SIZE + 1).validate().is_err());
        assert!(at_limit.with_queue_depth(MAX_QUEUE_DEPTH + 1).validate().is_err());
    }

    #[test]
    fn test_hash_algorithm() {
        assert_eq!(HashAlgorithm::Crc32.output_size(), 4);
        assert_eq!(HashAlgorithm::Md5.output_size(), 16);
        assert_eq!(HashAlgorithm::Sha1.output_size(), 20);
        assert_eq!(HashAlgorithm::Sha1.name(), "SHA-1");

        for algorithm in HashAlgorithm::ALL {
            assert_eq!(HashAlgorithm::from_code(algorithm.code()), Some(algorithm));
        }
        assert_eq!(HashAlgorithm::from_code('x'), None);
    }

    #[test]
    fn test_engine_config_from_cli() {
        let args = CliArgs::parse_from(["fanhash", "-e", "m,cs", "-b", "4K", "--timeout", "250ms"]);
        assert_eq!(args.encodings, vec!["m".to_string(), "cs".to_string()]);

        let config = EngineConfig::from_cli(&args).unwrap();
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.queue_depth, DEFAULT_QUEUE_DEPTH);
        assert_eq!(config.worker_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_engine_config_rejects_zero_buffer() {
        let args = CliArgs::parse_from(["fanhash", "-e", "m", "-b", "0"]);
        assert!(EngineConfig::from_cli(&args).is_err());

        let args = CliArgs::parse_from(["fanhash", "-e", "m", "--timeout", "soon"]);
        assert!(EngineConfig::from_cli(&args).is_err());
    }

    #[test]
    fn test_encoding_required() {
        assert!(CliArgs::try_parse_from(["fanhash", "file.bin"]).is_err());
    }

    #[test]
    fn test_license_flag_needs_no_encoding() {
        let args = CliArgs::try_parse_from(["fanhash", "-l"]).unwrap();
        assert!(args.license);
        assert!(args.encodings.is_empty());

        let args = CliArgs::try_parse_from(["fanhash", "--license", "-e", "m"]).unwrap();
        assert!(args.license);

        let args = CliArgs::try_parse_from(["fanhash", "-e", "m"]).unwrap();
        assert!(!args.license);
    }
}
