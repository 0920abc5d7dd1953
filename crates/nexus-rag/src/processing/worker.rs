//! Background worker draining the ingestion queue

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::timeout;

use crate::error::Error;
use crate::ingestion::{IngestOutcome, IngestPipeline};
use crate::storage::DocumentDb;

use super::job_queue::{IngestJob, JobQueue, JobState};

/// Drains the queue, running each job on its own task.
///
/// Jobs for different documents run concurrently with no ordering
/// guarantee. A racing reprocess of the same document is an accepted race:
/// the last transactional chunk replacement wins.
pub struct IngestWorker {
    pipeline: Arc<IngestPipeline>,
    db: Arc<DocumentDb>,
    queue: Arc<JobQueue>,
    /// Concurrent jobs allowed
    parallelism: usize,
    /// Hard bound per job; on expiry the document is forced to error so it
    /// cannot sit in `processing` forever
    job_timeout: Duration,
}

impl IngestWorker {
    pub fn new(
        pipeline: Arc<IngestPipeline>,
        db: Arc<DocumentDb>,
        queue: Arc<JobQueue>,
        parallelism: usize,
        job_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            db,
            queue,
            parallelism: parallelism.max(1),
            job_timeout,
        }
    }

    /// Run until the submitting side of the queue is dropped
    pub async fn run(self, mut receiver: mpsc::Receiver<IngestJob>) {
        tracing::info!(
            "ingestion worker started: {} parallel jobs, {}s timeout",
            self.parallelism,
            self.job_timeout.as_secs()
        );

        let semaphore = Arc::new(Semaphore::new(self.parallelism));

        while let Some(job) = receiver.recv().await {
            let permit = semaphore.clone().acquire_owned().await.unwrap();
            let pipeline = self.pipeline.clone();
            let db = self.db.clone();
            let queue = self.queue.clone();
            let job_timeout = self.job_timeout;

            tokio::spawn(async move {
                let _permit = permit;
                queue.mark(job.document_id, JobState::Running);

                match timeout(job_timeout, pipeline.process(job.document_id, job.owner_id)).await {
                    Ok(Ok(IngestOutcome::Processed { chunk_count })) => {
                        queue.mark(job.document_id, JobState::Done);
                        tracing::info!(
                            "ingestion finished for {}: {} chunks",
                            job.document_id,
                            chunk_count
                        );
                    }
                    Ok(Ok(IngestOutcome::Failed(reason))) => {
                        queue.mark(job.document_id, JobState::Done);
                        tracing::warn!(
                            "ingestion for {} ended in error status: {:?}",
                            job.document_id,
                            reason
                        );
                    }
                    Ok(Err(Error::NotFound(_))) => {
                        queue.mark(job.document_id, JobState::Failed);
                        tracing::warn!(
                            "ingestion job for {} referenced a missing document",
                            job.document_id
                        );
                    }
                    Ok(Err(e)) => {
                        queue.mark(job.document_id, JobState::Failed);
                        tracing::error!("ingestion for {} failed: {}", job.document_id, e);
                        if let Err(e) = db.mark_error(job.document_id, None) {
                            tracing::error!(
                                "could not record error status for {}: {}",
                                job.document_id,
                                e
                            );
                        }
                    }
                    Err(_) => {
                        queue.mark(job.document_id, JobState::Failed);
                        tracing::error!(
                            "ingestion for {} timed out after {}s, forcing error status",
                            job.document_id,
                            job_timeout.as_secs()
                        );
                        if let Err(e) = db.mark_error(job.document_id, None) {
                            tracing::error!(
                                "could not record timeout status for {}: {}",
                                job.document_id,
                                e
                            );
                        }
                    }
                }
            });
        }

        tracing::info!("ingestion worker stopped");
    }
}
