//! Bounded chunk conduits between the coordinator and one worker
//!
//! A conduit is a single-producer/single-consumer crossbeam channel of
//! owned chunks. The writing half blocks while the queue is full, which is
//! what throttles the source to the slowest worker. The reading half is a
//! [`Read`] adapter that checks the worker's cancellation token on every
//! call, so a cancelled worker stops at its next read even in the middle of
//! a chunk.

use super::worker::CancelToken;
use crossbeam::channel::{bounded, Receiver, Sender};
use std::io::{self, Read};
use std::sync::Arc;

/// Message carried by a conduit
#[derive(Debug)]
enum Frame {
    /// Next chunk of input
    Data(Arc<[u8]>),
    /// The source failed; no more data will follow
    Abort(String),
}

/// Create a conduit holding at most `capacity` chunks
pub fn conduit(capacity: usize, token: CancelToken) -> (ConduitWriter, ConduitReader) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        ConduitWriter { tx: Some(tx) },
        ConduitReader {
            rx,
            token,
            current: None,
            pos: 0,
            state: ReaderState::Open,
        },
    )
}

/// Coordinator half of a conduit
#[derive(Debug)]
pub struct ConduitWriter {
    tx: Option<Sender<Frame>>,
}

impl ConduitWriter {
    /// Queue a chunk, blocking while the worker's queue is full
    ///
    /// Returns `false` once the worker has stopped reading; the chunk is
    /// dropped and the writer is closed.
    pub fn send(&mut self, chunk: Arc<[u8]>) -> bool {
        let delivered = match &self.tx {
            Some(tx) => tx.send(Frame::Data(chunk)).is_ok(),
            None => false,
        };
        if !delivered {
            self.tx = None;
        }
        delivered
    }

    /// Tell the worker the source failed, then close
    pub fn abort(&mut self, message: &str) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Frame::Abort(message.to_string()));
        }
    }

    /// Signal end of input
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// True until closed, aborted, or the worker went away
    pub fn is_open(&self) -> bool {
        self.tx.is_some()
    }
}

/// How a reader stopped, if it has
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderState {
    /// Still delivering data
    Open,
    /// All input delivered
    Eof,
    /// The source failed with this message
    Aborted(String),
    /// The worker's token was cancelled
    Cancelled,
}

/// Worker half of a conduit
#[derive(Debug)]
pub struct ConduitReader {
    rx: Receiver<Frame>,
    token: CancelToken,
    current: Option<Arc<[u8]>>,
    pos: usize,
    state: ReaderState,
}

impl ConduitReader {
    /// Why the reader stopped
    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    fn check_cancelled(&mut self) -> io::Result<()> {
        if self.token.is_cancelled() {
            self.current = None;
            self.state = ReaderState::Cancelled;
            return Err(io::Error::new(io::ErrorKind::Other, "worker cancelled"));
        }
        Ok(())
    }

    fn next_chunk(&mut self) -> io::Result<bool> {
        match &self.state {
            ReaderState::Open => {}
            ReaderState::Eof => return Ok(false),
            ReaderState::Aborted(message) => {
                return Err(io::Error::new(io::ErrorKind::Other, message.clone()))
            }
            ReaderState::Cancelled => {
                return Err(io::Error::new(io::ErrorKind::Other, "worker cancelled"))
            }
        }

        match self.rx.recv() {
            Ok(Frame::Data(chunk)) => {
                self.current = Some(chunk);
                self.pos = 0;
                Ok(true)
            }
            Ok(Frame::Abort(message)) => {
                self.current = None;
                self.state = ReaderState::Aborted(message.clone());
                Err(io::Error::new(io::ErrorKind::Other, message))
            }
            Err(_) => {
                self.current = None;
                self.state = ReaderState::Eof;
                Ok(false)
            }
        }
    }
}

impl Read for ConduitReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.check_cancelled()?;

        loop {
            if let Some(chunk) = &self.current {
                if self.pos < chunk.len() {
                    let n = buf.len().min(chunk.len() - self.pos);
                    buf[..n].copy_from_slice(&chunk[self.pos..self.pos + n]);
                    self.pos += n;
                    return Ok(n);
                }
            }

            if !self.next_chunk()? {
                return Ok(0);
            }
        }
    }
}
