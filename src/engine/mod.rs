//! Concurrent fan-out engine
//!
//! Broadcasts one input to a worker thread per pipeline over bounded
//! conduits and gathers the results in declaration order.

pub mod conduit;
mod fanout;
pub mod worker;

pub use fanout::*;
pub use worker::{CancelToken, WorkerState};
