//! # fanhash - Concurrent Multi-Algorithm Hashing
//!
//! fanhash computes several hash pipelines over one input while reading the
//! input only once. Each pipeline is a chain of CRC32, MD5 and SHA-1 stages
//! where every stage hashes the raw output of the stage before it.
//!
//! ## Features
//!
//! - **Chained Pipelines**: `"cm"` means CRC32, then MD5 of the CRC bytes
//! - **Single-Read Fan-Out**: one reader, one worker thread per pipeline
//! - **Bounded Memory**: bounded queues throttle the reader to the slowest pipeline
//! - **All-or-Nothing Results**: ordered hashes, or every failure in order
//! - **Cooperative Timeouts**: stalled workers are cancelled, never killed
//!
//! ## Quick Start
//!
//! ```no_run
//! use fanhash::engine::FanOutEngine;
//! use fanhash::hash::parse_pipelines;
//! use std::fs::File;
//!
//! let pipelines = parse_pipelines(&["m", "s", "cm"], 1024).unwrap();
//! let engine = FanOutEngine::default();
//!
//! let results = engine.run(File::open("/data/archive.bin").unwrap(), &pipelines).unwrap();
//! for result in results {
//!     println!("{}", result);
//! }
//! ```
//!
//! ## In-Memory Input
//!
//! ```
//! use fanhash::engine::FanOutEngine;
//! use fanhash::hash::parse_pipelines;
//!
//! let pipelines = parse_pipelines(&["c", "m"], 1024).unwrap();
//! let results = FanOutEngine::default().run_str("foobar", &pipelines).unwrap();
//!
//! assert_eq!(results[0].to_hex(), "9ef61f95");
//! assert_eq!(results[1].to_hex(), "3858f62230ac3c915f300c664312c63f");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod hash;

// Re-export commonly used types
pub use config::{EngineConfig, HashAlgorithm};
pub use engine::{FanOutEngine, FanOutRequest, InputSource};
pub use error::{FanHashError, FanOutError, Result};
pub use hash::{HashResult, Pipeline, StreamHash};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Full text of the license fanhash is released under
pub const LICENSE: &str = include_str!("../LICENSE");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use fanhash::prelude::*;
    //! ```

    pub use crate::config::{EngineConfig, HashAlgorithm};
    pub use crate::engine::{FanOutEngine, FanOutRequest, InputSource};
    pub use crate::error::{FanHashError, FanOutError, PipelineFailure, Result};
    pub use crate::hash::{compute_bytes, compute_reader, parse_pipelines, HashResult, Pipeline, StreamHash};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_matches_manifest() {
        assert_eq!(env!("CARGO_PKG_LICENSE"), "MIT");
        assert!(LICENSE.starts_with("MIT License"));
        assert!(LICENSE.contains("WITHOUT WARRANTY OF ANY KIND"));
    }
}
