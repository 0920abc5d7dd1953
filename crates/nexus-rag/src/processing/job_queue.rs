//! Queue for detached ingestion jobs
//!
//! Upload handlers enqueue and return immediately; the only caller-visible
//! completion signal is the document row's status. Delivery is best-effort
//! by design: a dropped job leaves the document in `processing` until the
//! user reprocesses it.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One queued ingestion run
#[derive(Debug, Clone, Copy)]
pub struct IngestJob {
    pub document_id: Uuid,
    pub owner_id: Uuid,
}

/// Observable state of a job, keyed by document id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
}

/// Handle for submitting jobs and reading queue statistics
pub struct JobQueue {
    sender: mpsc::Sender<IngestJob>,
    jobs: Arc<DashMap<Uuid, JobState>>,
    worker_count: usize,
}

impl JobQueue {
    /// Create the queue; the receiver half goes to the worker
    pub fn new(worker_count: usize, capacity: usize) -> (Self, mpsc::Receiver<IngestJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            sender,
            jobs: Arc::new(DashMap::new()),
            worker_count,
        };
        (queue, receiver)
    }

    /// Enqueue a job. Returns false when the queue is unavailable; the
    /// caller has already responded, so the failure is only logged.
    pub async fn submit(&self, job: IngestJob) -> bool {
        self.jobs.insert(job.document_id, JobState::Queued);
        match self.sender.send(job).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("failed to enqueue ingestion for {}: {}", job.document_id, e);
                self.jobs.insert(job.document_id, JobState::Failed);
                false
            }
        }
    }

    /// Record a job state change (worker side)
    pub fn mark(&self, document_id: Uuid, state: JobState) {
        self.jobs.insert(document_id, state);
    }

    /// State of the job for a document, if one was ever submitted
    pub fn state(&self, document_id: Uuid) -> Option<JobState> {
        self.jobs.get(&document_id).map(|s| *s)
    }

    /// Queue statistics
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            worker_count: self.worker_count,
            ..QueueStats::default()
        };
        for entry in self.jobs.iter() {
            match *entry.value() {
                JobState::Queued => stats.queued += 1,
                JobState::Running => stats.running += 1,
                JobState::Done => stats.done += 1,
                JobState::Failed => stats.failed += 1,
            }
        }
        stats
    }
}

/// Snapshot of the queue for the jobs endpoint
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    pub worker_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_and_stats() {
        let (queue, mut receiver) = JobQueue::new(2, 16);
        let job = IngestJob {
            document_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };

        assert!(queue.submit(job).await);
        assert_eq!(queue.state(job.document_id), Some(JobState::Queued));
        assert_eq!(queue.stats().queued, 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.document_id, job.document_id);

        queue.mark(job.document_id, JobState::Done);
        let stats = queue.stats();
        assert_eq!(stats.queued, 0);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.worker_count, 2);
    }

    #[tokio::test]
    async fn test_submit_after_receiver_dropped() {
        let (queue, receiver) = JobQueue::new(1, 4);
        drop(receiver);

        let job = IngestJob {
            document_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
        };
        assert!(!queue.submit(job).await);
        assert_eq!(queue.state(job.document_id), Some(JobState::Failed));
    }
}
