//! Background page fetching
//!
//! Loads dataset pages on a worker thread so the event loop never blocks on
//! file reads. Results come back over a channel and are picked up by
//! [`FetchRunner::poll`] on each tick.

use super::dataset::{load_page, Page};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Instant;

/// Message sent from the worker back to the event loop
#[derive(Debug)]
pub enum FetchMessage {
    Page(Page),
    Failed(String),
}

/// A fetch in flight
struct PendingFetch {
    receiver: Receiver<FetchMessage>,
    start_instant: Instant,
    offset: usize,
}

/// Runs at most one page fetch at a time
pub struct FetchRunner {
    dataset_path: PathBuf,
    pending: Option<PendingFetch>,
}

impl FetchRunner {
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            pending: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start fetching `limit` rows from `offset`
    ///
    /// Returns false without doing anything if a fetch is already running.
    pub fn spawn(&mut self, offset: usize, limit: usize) -> bool {
        if self.is_busy() {
            tracing::debug!(offset, "fetch already in flight, skipping");
            return false;
        }
        let (tx, rx) = mpsc::channel();
        let path = self.dataset_path.clone();

        thread::spawn(move || {
            Self::run_fetch(path, offset, limit, tx);
        });

        tracing::debug!(offset, limit, "page fetch started");
        self.pending = Some(PendingFetch {
            receiver: rx,
            start_instant: Instant::now(),
            offset,
        });
        true
    }

    /// Take the result of the running fetch if it has finished
    pub fn poll(&mut self) -> Option<FetchMessage> {
        let pending = self.pending.as_ref()?;
        let message = match pending.receiver.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                FetchMessage::Failed("fetch worker exited without a result".to_string())
            }
        };
        tracing::debug!(
            offset = pending.offset,
            elapsed_ms = pending.start_instant.elapsed().as_millis() as u64,
            "page fetch finished"
        );
        self.pending = None;
        Some(message)
    }

    fn run_fetch(path: PathBuf, offset: usize, limit: usize, tx: Sender<FetchMessage>) {
        let message = match load_page(&path, offset, limit) {
            Ok(page) => FetchMessage::Page(page),
            Err(e) => FetchMessage::Failed(e.to_string()),
        };
        let _ = tx.send(message);
    }
}
