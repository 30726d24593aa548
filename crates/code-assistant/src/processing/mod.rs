//! Background document processing with a job queue and a bounded worker

mod job_queue;
mod worker;

pub use job_queue::{IngestJob, JobQueue, QueueStats};
pub use worker::ProcessingWorker;

use std::sync::Arc;

use crate::config::ProcessingConfig;
use crate::providers::{OcrEngine, RetrievalService};
use crate::storage::Database;

/// Create the job queue and spawn the worker draining it
///
/// Must be called from within a tokio runtime.
pub fn start(
    config: &ProcessingConfig,
    db: Database,
    retrieval: Arc<dyn RetrievalService>,
    ocr: Arc<dyn OcrEngine>,
) -> Arc<JobQueue> {
    let (queue, receiver) = JobQueue::new(config.queue_capacity);
    let queue = Arc::new(queue);

    let worker = ProcessingWorker::new(db, retrieval, ocr, queue.clone(), config.concurrency());
    tokio::spawn(worker.run(receiver));

    queue
}
