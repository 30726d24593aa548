//! Background worker indexing uploaded documents

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};

use crate::error::Result;
use crate::providers::{DocumentMetadata, OcrEngine, RetrievalService};
use crate::storage::{Database, ProcessingOutcome};

use super::job_queue::{IngestJob, JobQueue};

/// Worker draining the job queue
///
/// Every job runs on its own task; the semaphore bounds how many run at once.
/// Failures end up in the document status and the log, never in a caller.
pub struct ProcessingWorker {
    db: Database,
    retrieval: Arc<dyn RetrievalService>,
    ocr: Arc<dyn OcrEngine>,
    queue: Arc<JobQueue>,
    semaphore: Arc<Semaphore>,
}

impl ProcessingWorker {
    pub fn new(
        db: Database,
        retrieval: Arc<dyn RetrievalService>,
        ocr: Arc<dyn OcrEngine>,
        queue: Arc<JobQueue>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            db,
            retrieval,
            ocr,
            queue,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Process jobs until every sender is dropped
    pub async fn run(self, mut receiver: mpsc::Receiver<IngestJob>) {
        tracing::info!(
            "Processing worker started: {} concurrent documents",
            self.semaphore.available_permits()
        );

        let worker = Arc::new(self);
        while let Some(job) = receiver.recv().await {
            worker.queue.mark_started();

            let permit = match worker.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Processing semaphore closed, dropping job for {}", job.document_id);
                    worker.queue.finish(job.document_id, false);
                    break;
                }
            };

            let worker = worker.clone();
            tokio::spawn(async move {
                let _permit = permit;
                worker.process(job).await;
            });
        }

        tracing::info!("Processing worker stopped");
    }

    /// Run one job to completion and record its outcome
    pub async fn process(&self, job: IngestJob) {
        let document_id = job.document_id;
        let start = Instant::now();

        let outcome = match self.index_document(&job).await {
            Ok(Some(chunk_count)) => {
                tracing::info!(
                    "Indexed {} ({} chunks) in {:.1}s",
                    job.filename,
                    chunk_count,
                    start.elapsed().as_secs_f64()
                );
                Some(ProcessingOutcome::Completed { chunk_count })
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Error processing document {} ({}): {}", document_id, job.filename, e);
                Some(ProcessingOutcome::Failed)
            }
        };

        let success = matches!(outcome, Some(ProcessingOutcome::Completed { .. }));
        if let Some(outcome) = outcome {
            self.record(&job, outcome).await;
        }
        self.queue.finish(document_id, success);
    }

    /// Index the job's file. `Ok(None)` when the document vanished before we started.
    async fn index_document(&self, job: &IngestJob) -> Result<Option<usize>> {
        if self.db.get_document(job.document_id)?.is_none() {
            tracing::warn!("Document {} was deleted before processing", job.document_id);
            return Ok(None);
        }
        self.db.mark_processing(job.document_id)?;

        let document_id = job.document_id.to_string();
        let mut metadata = DocumentMetadata::new();
        metadata.insert("filename".to_string(), job.filename.clone());

        let chunk_count = if job.is_image {
            let text = self.ocr.extract_text(&job.file_path).await?;
            let sidecar = job.ocr_sidecar_path();
            tokio::fs::write(&sidecar, text.as_bytes()).await?;

            metadata.insert("type".to_string(), "image_ocr".to_string());
            metadata.insert(
                "original_image".to_string(),
                job.file_path.display().to_string(),
            );
            self.retrieval.add_document(&sidecar, &document_id, metadata).await?
        } else {
            self.retrieval
                .add_document(&job.file_path, &document_id, metadata)
                .await?
        };

        Ok(Some(chunk_count))
    }

    async fn record(&self, job: &IngestJob, outcome: ProcessingOutcome) {
        match self.db.finish_processing(job.document_id, outcome) {
            Ok(true) => {}
            Ok(false) => {
                // Row deleted (or already finished) while we were indexing
                let gone = matches!(self.db.get_document(job.document_id), Ok(None));
                if gone {
                    let document_id = job.document_id.to_string();
                    match self.retrieval.delete_document(&document_id).await {
                        Ok(removed) if removed > 0 => tracing::info!(
                            "Removed {} orphaned chunks of deleted document {}",
                            removed,
                            document_id
                        ),
                        Ok(_) => {}
                        Err(e) => tracing::warn!(
                            "Failed to remove chunks of deleted document {}: {}",
                            document_id,
                            e
                        ),
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to record outcome for document {}: {}", job.document_id, e);
            }
        }
    }
}
