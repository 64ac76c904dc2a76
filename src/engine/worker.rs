//! Fan-out workers
//!
//! Each worker owns the reading half of one conduit and runs one
//! [`StreamHash`] over it on a dedicated thread. It reports exactly one
//! [`WorkerReport`] over the shared result channel.

use super::conduit::{ConduitReader, ReaderState};
use crate::error::FanHashError;
use crate::hash::{HashResult, StreamHash};
use crossbeam::channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Cooperative cancellation flag shared by the coordinator and one worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an untriggered token
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Lifecycle of one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, thread not started
    Idle,
    /// Consuming input
    Running,
    /// Produced a hash
    Completed,
    /// Stopped with an error
    Failed,
    /// Stopped after its cancellation token fired
    Cancelled,
}

impl WorkerState {
    /// Completed, Failed and Cancelled are final
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Move to `next` if the transition is legal
    pub fn transition(self, next: WorkerState) -> Option<WorkerState> {
        let legal = matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        );
        legal.then_some(next)
    }
}

/// How a worker finished
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The pipeline produced a hash
    Completed(HashResult),
    /// The pipeline or the shared source failed
    Failed(FanHashError),
    /// The worker stopped because it was cancelled
    Cancelled,
}

impl WorkerOutcome {
    /// Terminal state matching this outcome
    pub fn state(&self) -> WorkerState {
        match self {
            Self::Completed(_) => WorkerState::Completed,
            Self::Failed(_) => WorkerState::Failed,
            Self::Cancelled => WorkerState::Cancelled,
        }
    }
}

/// Message a worker sends when it stops
#[derive(Debug)]
pub struct WorkerReport {
    /// Declaration index of the worker's pipeline
    pub index: usize,
    /// What happened
    pub outcome: WorkerOutcome,
}

/// Coordinator-side view of a running worker
pub struct WorkerHandle {
    index: usize,
    label: String,
    token: CancelToken,
    state: WorkerState,
    thread: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Declaration index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Pipeline label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current lifecycle state as seen by the coordinator
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Signal cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Record the worker's terminal state
    pub(crate) fn finish(&mut self, state: WorkerState) {
        if let Some(next) = self.state.transition(state) {
            self.state = next;
        }
    }

    /// Join the thread; only called once the worker has reported
    pub(crate) fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Worker {} ({}) panicked", self.index, self.label);
            }
        }
    }

    /// Drop the join handle without waiting
    pub(crate) fn detach(&mut self) {
        if self.thread.take().is_some() {
            tracing::warn!(
                "Worker {} ({}) did not acknowledge cancellation; detaching",
                self.index,
                self.label
            );
        }
    }
}

/// Start a worker thread running `hasher` over `reader`
pub fn spawn_worker(
    index: usize,
    hasher: Arc<dyn StreamHash>,
    reader: ConduitReader,
    token: CancelToken,
    reports: Sender<WorkerReport>,
) -> std::io::Result<WorkerHandle> {
    let label = hasher.label();
    let mut handle = WorkerHandle {
        index,
        label: label.clone(),
        token,
        state: WorkerState::Idle,
        thread: None,
    };

    let thread = thread::Builder::new()
        .name(format!("fanhash-worker-{}", index))
        .spawn(move || {
            let outcome = run_worker(hasher.as_ref(), reader);
            tracing::debug!("Worker {} ({}) finished: {:?}", index, label, outcome.state());
            // the coordinator may have stopped listening after a timeout
            let _ = reports.send(WorkerReport { index, outcome });
        })?;

    handle.thread = Some(thread);
    handle.state = WorkerState::Running;
    Ok(handle)
}

fn run_worker(hasher: &dyn StreamHash, mut reader: ConduitReader) -> WorkerOutcome {
    match hasher.hash_stream(&mut reader) {
        Ok(result) => WorkerOutcome::Completed(result),
        Err(error) => match reader.state() {
            ReaderState::Cancelled => WorkerOutcome::Cancelled,
            ReaderState::Aborted(message) => {
                WorkerOutcome::Failed(FanHashError::SourceRead(message.clone()))
            }
            ReaderState::Open | ReaderState::Eof => WorkerOutcome::Failed(error),
        },
    }
}
