//! Background ingestion of uploaded files.
//!
//! A single worker thread drains a channel of file paths and feeds each file
//! through [`DocumentIndex::add_document`]. One worker means uploads reach the
//! index one at a time, in submission order, through the same writer lock as
//! every other mutation.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::file_info::{file_metadata, read_document};
use super::{IngestError, IngestResult};
use crate::coordinator::DocumentIndex;
use crate::error::IndexError;

/// Outcome of one file, passed to the observer as it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestEvent {
    pub path: PathBuf,
    /// Assigned document id, or the failure message
    pub result: Result<String, String>,
    /// False when the document was indexed but could not be saved
    pub durable: bool,
}

/// Totals returned by [`IngestQueue::shutdown`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestSummary {
    /// `(path, document id)` for every indexed file
    pub indexed: Vec<(PathBuf, String)>,
    /// `(path, reason)` for every file that was skipped
    pub failed: Vec<(PathBuf, String)>,
    /// Indexed files whose save failed
    pub not_durable: usize,
}

impl IngestSummary {
    pub fn processed(&self) -> usize {
        self.indexed.len() + self.failed.len()
    }
}

type Observer = Box<dyn Fn(&IngestEvent) + Send>;

/// Fire-and-forget upload queue with one worker thread.
pub struct IngestQueue {
    sender: Option<Sender<PathBuf>>,
    worker: Option<JoinHandle<IngestSummary>>,
}

impl IngestQueue {
    /// Starts the worker.
    pub fn start(index: Arc<DocumentIndex>, max_file_size: u64) -> Self {
        Self::start_with_observer(index, max_file_size, |_| {})
    }

    /// Starts the worker, calling `observer` after every file.
    pub fn start_with_observer<F>(index: Arc<DocumentIndex>, max_file_size: u64, observer: F) -> Self
    where
        F: Fn(&IngestEvent) + Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let observer: Observer = Box::new(observer);
        let worker =
            thread::spawn(move || run_worker(&index, max_file_size, &receiver, &observer));

        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Queues a file and returns immediately.
    pub fn submit(&self, path: impl Into<PathBuf>) -> IngestResult<()> {
        let sender = self.sender.as_ref().ok_or(IngestError::QueueClosed)?;
        sender
            .send(path.into())
            .map_err(|_| IngestError::QueueClosed)
    }

    /// Stops accepting files, waits for the queue to drain and returns totals.
    pub fn shutdown(mut self) -> IngestResult<IngestSummary> {
        self.sender.take();
        let worker = self.worker.take().ok_or(IngestError::QueueClosed)?;
        join_worker(worker)
    }
}

impl Drop for IngestQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish what is queued
        self.sender.take();
        if let Some(Err(e)) = self.worker.take().map(join_worker) {
            warn!("Ingest queue dropped without a summary: {e}");
        }
    }
}

fn join_worker(worker: JoinHandle<IngestSummary>) -> IngestResult<IngestSummary> {
    worker.join().map_err(|_| {
        warn!("Ingest worker panicked; files still queued were not indexed");
        IngestError::WorkerPanicked
    })
}

fn run_worker(
    index: &DocumentIndex,
    max_file_size: u64,
    receiver: &Receiver<PathBuf>,
    observer: &Observer,
) -> IngestSummary {
    let mut summary = IngestSummary::default();

    for path in receiver.iter() {
        debug!("Processing file: {}", path.display());
        let event = match ingest_file(index, &path, max_file_size) {
            Ok((id, durable)) => {
                info!("Indexed {} as {id}", path.display());
                if !durable {
                    summary.not_durable += 1;
                }
                summary.indexed.push((path.clone(), id.clone()));
                IngestEvent {
                    path,
                    result: Ok(id),
                    durable,
                }
            }
            Err(e) => {
                warn!("Skipped {}: {e}", path.display());
                summary.failed.push((path.clone(), e.to_string()));
                IngestEvent {
                    path,
                    result: Err(e.to_string()),
                    durable: true,
                }
            }
        };
        observer(&event);
    }

    info!(
        "Ingestion finished: {} indexed, {} failed",
        summary.indexed.len(),
        summary.failed.len()
    );
    summary
}

/// Reads one file and adds it to the index.
///
/// Returns the new document id and whether the index was saved afterwards.
pub fn ingest_file(
    index: &DocumentIndex,
    path: &Path,
    max_file_size: u64,
) -> IngestResult<(String, bool)> {
    let (text, size) = read_document(path, max_file_size)?;
    let metadata = file_metadata(path, size);
    let outcome = index.add_document(text, metadata, None)?;

    let id = outcome
        .ids
        .into_iter()
        .next()
        .ok_or_else(|| IndexError::General("no document id assigned".to_string()))?;
    Ok((id, outcome.durability.is_durable()))
}
