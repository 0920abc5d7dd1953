//! Document ingestion: extraction, chunking, and orchestration

pub mod chunker;
pub mod extractor;
pub mod pipeline;

pub use chunker::TextChunker;
pub use extractor::TextExtractor;
pub use pipeline::{IngestFailure, IngestOutcome, IngestPipeline};
