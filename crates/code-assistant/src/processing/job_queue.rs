//! Job queue for background document processing
//!
//! At most one job per document is in flight at a time.

use dashmap::DashMap;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::document::ocr_sidecar_path;
use crate::types::Document;

/// A document waiting to be indexed
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub document_id: Uuid,
    /// Original file name, used as the citation source
    pub filename: String,
    /// Stored upload
    pub file_path: PathBuf,
    /// Whether text must be recovered with OCR first
    pub is_image: bool,
}

impl IngestJob {
    pub fn for_document(doc: &Document) -> Self {
        Self {
            document_id: doc.id,
            filename: doc.filename.clone(),
            file_path: doc.file_path.clone(),
            is_image: doc.kind().map(|k| k.is_image()).unwrap_or(false),
        }
    }

    /// Where OCR output for an image upload is written
    pub fn ocr_sidecar_path(&self) -> PathBuf {
        ocr_sidecar_path(&self.file_path)
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Job queue feeding the processing worker
pub struct JobQueue {
    sender: mpsc::Sender<IngestJob>,
    /// Documents submitted and not yet finished
    in_flight: DashMap<Uuid, Instant>,
    queued: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl JobQueue {
    /// Create a queue and the receiver the worker drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<IngestJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            sender,
            in_flight: DashMap::new(),
            queued: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };
        (queue, receiver)
    }

    /// Submit a job. Returns `Ok(false)` when the document already has a job in flight.
    pub async fn submit(&self, job: IngestJob) -> Result<bool> {
        let document_id = job.document_id;

        match self.in_flight.entry(document_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                tracing::warn!("Document {} is already being processed", document_id);
                return Ok(false);
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Instant::now());
            }
        }

        self.queued.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.sender.send(job).await {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            self.in_flight.remove(&document_id);
            return Err(Error::Internal(format!("Processing queue closed: {}", e)));
        }

        tracing::debug!("Queued document {} for processing", document_id);
        Ok(true)
    }

    /// Note that the worker picked a job off the channel
    pub(crate) fn mark_started(&self) {
        let _ = self
            .queued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Release the in-flight slot of a document and record the outcome
    pub(crate) fn finish(&self, document_id: Uuid, success: bool) {
        if let Some((_, started)) = self.in_flight.remove(&document_id) {
            tracing::debug!(
                "Document {} left the queue after {:?}",
                document_id,
                started.elapsed()
            );
        }
        if success {
            self.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn is_in_flight(&self, document_id: Uuid) -> bool {
        self.in_flight.contains_key(&document_id)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.queued.load(Ordering::SeqCst),
            in_flight: self.in_flight.len(),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: Uuid) -> IngestJob {
        IngestJob {
            document_id: id,
            filename: "notes.pdf".into(),
            file_path: PathBuf::from("uploads/notes.pdf"),
            is_image: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected() {
        let (queue, mut receiver) = JobQueue::new(8);
        let id = Uuid::new_v4();

        assert!(queue.submit(job(id)).await.unwrap());
        assert!(!queue.submit(job(id)).await.unwrap());
        assert!(queue.is_in_flight(id));
        assert_eq!(queue.stats().queued, 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.document_id, id);
        queue.mark_started();
        queue.finish(id, true);

        assert!(!queue.is_in_flight(id));
        assert!(queue.submit(job(id)).await.unwrap());
        assert_eq!(queue.stats().completed, 1);
    }

    #[tokio::test]
    async fn test_closed_queue_releases_slot() {
        let (queue, receiver) = JobQueue::new(1);
        drop(receiver);
        let id = Uuid::new_v4();

        assert!(queue.submit(job(id)).await.is_err());
        assert!(!queue.is_in_flight(id));
        assert_eq!(queue.stats(), QueueStats::default());
    }

    #[test]
    fn test_sidecar_path() {
        let mut j = job(Uuid::new_v4());
        j.file_path = PathBuf::from("uploads/x_scan.png");
        assert_eq!(j.ocr_sidecar_path(), PathBuf::from("uploads/x_scan.png.txt"));
    }
}
