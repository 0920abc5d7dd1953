//! Detached background processing of ingestion jobs

pub mod job_queue;
pub mod worker;

pub use job_queue::{IngestJob, JobQueue, JobState, QueueStats};
pub use worker::IngestWorker;
