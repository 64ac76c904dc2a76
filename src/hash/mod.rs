//! Hash primitives and chained pipelines
//!
//! Provides CRC32, MD5 and SHA-1 over byte slices and streams, and
//! pipelines that feed one algorithm's output into the next.

mod digest;
mod pipeline;

pub use digest::*;
pub use pipeline::*;
