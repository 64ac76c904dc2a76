//! Fan-out coordinator
//!
//! Reads the source once and broadcasts every chunk to one worker per
//! pipeline. Results come back in declaration order, or every failure comes
//! back inside a [`FanOutError`](crate::error::FanOutError).
//!
//! Memory is bounded by `pipelines × queue_depth × buffer_size`: a full
//! worker queue blocks the reader, so the slowest pipeline sets the pace.

use super::conduit::{conduit, ConduitWriter};
use super::worker::{spawn_worker, CancelToken, WorkerHandle, WorkerOutcome, WorkerReport};
use crate::config::EngineConfig;
use crate::error::{collect_outcomes, FanHashError, Result};
use crate::hash::{HashResult, StreamHash};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError};
use rayon::prelude::*;
use std::borrow::Cow;
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::time::Instant;

/// Input for one fan-out call
pub enum InputSource<'a> {
    /// Finite byte stream, read exactly once
    Stream(Box<dyn Read + 'a>),
    /// In-memory buffer shared by every pipeline
    Bytes(Cow<'a, [u8]>),
}

impl<'a> InputSource<'a> {
    /// Wrap a reader
    pub fn stream(reader: impl Read + 'a) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Borrow a byte buffer
    pub fn bytes(data: &'a [u8]) -> Self {
        Self::Bytes(Cow::Borrowed(data))
    }
}

impl<'a> From<&'a str> for InputSource<'a> {
    fn from(s: &'a str) -> Self {
        Self::bytes(s.as_bytes())
    }
}

/// One input plus the ordered pipelines to run over it
pub struct FanOutRequest<'a> {
    /// Data to hash
    pub input: InputSource<'a>,
    /// Pipelines in declaration order
    pub pipelines: Vec<Arc<dyn StreamHash>>,
}

/// Slot bookkeeping while collecting worker reports
enum Slot {
    Pending,
    Reported(WorkerOutcome),
    TimedOut,
}

/// Runs several pipelines over one input concurrently
#[derive(Debug, Clone, Default)]
pub struct FanOutEngine {
    config: EngineConfig,
}

impl FanOutEngine {
    /// Create an engine with the given tuning
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine tuning
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a request on the path matching its input
    pub fn dispatch(&self, request: FanOutRequest<'_>) -> Result<Vec<HashResult>> {
        match request.input {
            InputSource::Stream(reader) => self.run(reader, &request.pipelines),
            InputSource::Bytes(data) => self.run_bytes(&data, &request.pipelines),
        }
    }

    /// Hash a string with every pipeline
    pub fn run_str(&self, input: &str, pipelines: &[Arc<dyn StreamHash>]) -> Result<Vec<HashResult>> {
        self.run_bytes(input.as_bytes(), pipelines)
    }

    /// Hash an in-memory buffer with every pipeline
    ///
    /// No conduits are involved; pipelines run in parallel over the shared
    /// buffer and every failure is reported.
    pub fn run_bytes(&self, input: &[u8], pipelines: &[Arc<dyn StreamHash>]) -> Result<Vec<HashResult>> {
        if pipelines.is_empty() {
            return Err(FanHashError::NoPipelines);
        }

        let outcomes: Vec<(String, Result<HashResult>)> = pipelines
            .par_iter()
            .map(|pipeline| (pipeline.label(), pipeline.hash_bytes(input)))
            .collect();

        collect_outcomes(outcomes)
    }

    /// Read `source` once and hash it with every pipeline concurrently
    pub fn run<R: Read>(&self, mut source: R, pipelines: &[Arc<dyn StreamHash>]) -> Result<Vec<HashResult>> {
        if pipelines.is_empty() {
            return Err(FanHashError::NoPipelines);
        }
        self.config.validate().map_err(FanHashError::Config)?;

        let (report_tx, report_rx) = unbounded::<WorkerReport>();
        let mut writers: Vec<ConduitWriter> = Vec::with_capacity(pipelines.len());
        let mut workers: Vec<WorkerHandle> = Vec::with_capacity(pipelines.len());

        for (index, pipeline) in pipelines.iter().enumerate() {
            let token = CancelToken::new();
            let (writer, reader) = conduit(self.config.queue_depth, token.clone());

            match spawn_worker(index, Arc::clone(pipeline), reader, token, report_tx.clone()) {
                Ok(handle) => {
                    writers.push(writer);
                    workers.push(handle);
                }
                Err(e) => {
                    // release the workers already started before giving up
                    for writer in &mut writers {
                        writer.close();
                    }
                    for worker in &mut workers {
                        worker.join();
                    }
                    return Err(FanHashError::worker(format!(
                        "failed to start worker for pipeline #{}: {}",
                        index, e
                    )));
                }
            }
        }
        drop(report_tx);

        tracing::debug!("Fanning out to {} pipelines", pipelines.len());

        match self.broadcast(&mut source, &mut writers) {
            Ok(bytes) => {
                tracing::debug!("Source exhausted after {} bytes", bytes);
                for writer in &mut writers {
                    writer.close();
                }
            }
            Err(message) => {
                tracing::debug!("Source read failed: {}", message);
                for writer in &mut writers {
                    writer.abort(&message);
                }
            }
        }

        let slots = self.collect(&report_rx, &mut workers, Instant::now());

        let outcomes = workers
            .iter()
            .zip(slots)
            .map(|(worker, slot)| {
                let outcome = match slot {
                    Slot::Reported(WorkerOutcome::Completed(result)) => Ok(result),
                    Slot::Reported(WorkerOutcome::Failed(error)) => Err(error),
                    Slot::Reported(WorkerOutcome::Cancelled) | Slot::TimedOut => {
                        Err(FanHashError::Timeout(self.config.worker_timeout))
                    }
                    Slot::Pending => Err(FanHashError::worker("worker exited without reporting")),
                };
                (worker.label().to_string(), outcome)
            })
            .collect();

        collect_outcomes(outcomes)
    }

    /// Copy the source into every open conduit, one chunk at a time
    ///
    /// Returns the byte count, or the read error's message.
    fn broadcast(&self, source: &mut dyn Read, writers: &mut [ConduitWriter]) -> std::result::Result<u64, String> {
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut total = 0u64;

        loop {
            let bytes_read = match source.read(&mut buffer) {
                Ok(0) => return Ok(total),
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.to_string()),
            };
            total += bytes_read as u64;

            let chunk: Arc<[u8]> = Arc::from(&buffer[..bytes_read]);
            let mut delivered = 0;
            for writer in writers.iter_mut().filter(|w| w.is_open()) {
                if writer.send(Arc::clone(&chunk)) {
                    delivered += 1;
                }
            }

            if delivered == 0 {
                tracing::debug!("No worker is reading; stopping after {} bytes", total);
                return Ok(total);
            }
        }
    }

    /// Wait for every worker, cancelling the ones that miss the deadline
    fn collect(
        &self,
        reports: &Receiver<WorkerReport>,
        workers: &mut [WorkerHandle],
        closed_at: Instant,
    ) -> Vec<Slot> {
        let mut slots: Vec<Slot> = workers.iter().map(|_| Slot::Pending).collect();
        let mut pending = workers.len();

        let deadline = closed_at + self.config.worker_timeout;
        while pending > 0 {
            match reports.recv_deadline(deadline) {
                Ok(report) => {
                    let worker = &mut workers[report.index];
                    worker.finish(report.outcome.state());
                    worker.join();
                    slots[report.index] = Slot::Reported(report.outcome);
                    pending -= 1;
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    // every thread is gone; the silent ones panicked
                    for worker in workers.iter_mut() {
                        worker.join();
                    }
                    return slots;
                }
            }
        }

        if pending == 0 {
            return slots;
        }

        for (worker, slot) in workers.iter().zip(slots.iter_mut()) {
            if matches!(slot, Slot::Pending) {
                tracing::warn!(
                    "Pipeline #{} ({}) still running {:?} after end of input; cancelling",
                    worker.index(),
                    worker.label(),
                    self.config.worker_timeout
                );
                worker.cancel();
                *slot = Slot::TimedOut;
            }
        }

        let grace = Instant::now() + self.config.cancel_grace;
        while pending > 0 {
            match reports.recv_deadline(grace) {
                Ok(report) => {
                    let worker = &mut workers[report.index];
                    worker.finish(report.outcome.state());
                    worker.join();
                    pending -= 1;
                }
                Err(_) => break,
            }
        }

        for worker in workers.iter_mut() {
            worker.detach();
        }

        slots
    }
}
