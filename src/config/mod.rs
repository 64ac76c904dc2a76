//! Configuration module for fanhash
//!
//! Provides CLI arguments, algorithm selection, and engine tuning.

mod settings;

pub use settings::*;
