//! Ingestion orchestration: download, extract, chunk, persist, flip status
//!
//! Per-document state machine: processing -> {processed, error}, re-entrant
//! through reprocess requests. Failures after the ownership check are
//! absorbed into the document's status; only an unknown/not-owned id is a
//! caller-visible error.

use std::sync::Arc;

use crate::config::NexusConfig;
use crate::error::{Error, Result};
use crate::storage::{DocumentDb, ObjectStore};
use crate::types::Chunk;
use uuid::Uuid;

use super::{TextChunker, TextExtractor};

/// Terminal result of one ingestion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Chunks persisted, document marked processed
    Processed { chunk_count: u32 },
    /// Document marked error
    Failed(IngestFailure),
}

/// Why an ingestion pass ended in error status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestFailure {
    /// Object storage did not return the bytes
    Download,
    /// Extraction produced no text
    EmptyExtraction,
}

/// Runs the extract -> chunk -> persist sequence for one document
pub struct IngestPipeline {
    db: Arc<DocumentDb>,
    object_store: Arc<dyn ObjectStore>,
    extractor: TextExtractor,
    chunker: TextChunker,
    insert_batch_size: usize,
}

impl IngestPipeline {
    pub fn new(db: Arc<DocumentDb>, object_store: Arc<dyn ObjectStore>, config: &NexusConfig) -> Self {
        Self {
            db,
            object_store,
            extractor: TextExtractor::new(
                config.extraction.max_input_bytes,
                config.extraction.max_output_chars,
            ),
            chunker: TextChunker::new(
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
                config.chunking.max_chunks,
            ),
            insert_batch_size: config.processing.insert_batch_size,
        }
    }

    /// Ingest (or re-ingest) one document on behalf of its owner.
    ///
    /// Returns `Err(NotFound)` without touching any state when the id is
    /// unknown or owned by someone else; every later failure lands in the
    /// document's status instead.
    pub async fn process(&self, document_id: Uuid, owner_id: Uuid) -> Result<IngestOutcome> {
        let document = self
            .db
            .get_document(document_id, owner_id)?
            .ok_or_else(|| Error::NotFound("Document not found".to_string()))?;

        tracing::info!(
            "processing document {} ({}, {})",
            document.id,
            document.name,
            document.media_type
        );

        let bytes = match self.object_store.get(&document.storage_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("download failed for document {}: {}", document.id, e);
                self.db.mark_error(document.id, None)?;
                return Ok(IngestOutcome::Failed(IngestFailure::Download));
            }
        };

        let text = self.extractor.extract(&bytes, &document.media_type);
        tracing::debug!("extracted {} chars from document {}", text.len(), document.id);

        if text.is_empty() {
            self.db.mark_error(document.id, Some(0))?;
            return Ok(IngestOutcome::Failed(IngestFailure::EmptyExtraction));
        }

        let chunks: Vec<Chunk> = self
            .chunker
            .chunk(&text)
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk::new(document.id, i as u32, content))
            .collect();
        let chunk_count = chunks.len() as u32;

        let inserted = self
            .db
            .replace_chunks(document.id, &chunks, self.insert_batch_size)?;
        if inserted < chunk_count {
            tracing::warn!(
                "document {}: {} of {} chunks persisted",
                document.id,
                inserted,
                chunk_count
            );
        }

        self.db.mark_processed(document.id, chunk_count)?;
        tracing::info!("document {} processed: {} chunks", document.id, chunk_count);

        Ok(IngestOutcome::Processed { chunk_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalObjectStore;
    use crate::types::{Document, DocumentStatus};
    use async_trait::async_trait;

    struct UnreachableStore;

    #[async_trait]
    impl ObjectStore for UnreachableStore {
        async fn put(&self, _path: &str, _data: &[u8]) -> Result<()> {
            Err(Error::ObjectStore("unreachable".to_string()))
        }
        async fn get(&self, _path: &str) -> Result<Vec<u8>> {
            Err(Error::ObjectStore("unreachable".to_string()))
        }
        async fn delete(&self, _path: &str) -> Result<()> {
            Err(Error::ObjectStore("unreachable".to_string()))
        }
        fn name(&self) -> &str {
            "unreachable"
        }
    }

    struct Fixture {
        db: Arc<DocumentDb>,
        store: Arc<LocalObjectStore>,
        pipeline: IngestPipeline,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(DocumentDb::in_memory().unwrap());
        let store = Arc::new(LocalObjectStore::new(dir.path().to_path_buf()));
        let pipeline = IngestPipeline::new(
            db.clone(),
            store.clone(),
            &NexusConfig::default(),
        );
        Fixture {
            db,
            store,
            pipeline,
            _dir: dir,
        }
    }

    async fn upload(f: &Fixture, owner: Uuid, media_type: &str, data: &[u8]) -> Document {
        let doc = Document::new(
            owner,
            "upload.bin".to_string(),
            media_type.to_string(),
            data.len() as u64,
            format!("{}/upload.bin", owner),
        );
        f.store.put(&doc.storage_path, data).await.unwrap();
        f.db.insert_document(&doc).unwrap();
        doc
    }

    #[tokio::test]
    async fn test_plain_text_reaches_processed() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let body = "alpha beta gamma ".repeat(200);
        let doc = upload(&f, owner, "text/plain", body.as_bytes()).await;

        let outcome = f.pipeline.process(doc.id, owner).await.unwrap();
        let loaded = f.db.get_document(doc.id, owner).unwrap().unwrap();

        assert_eq!(loaded.status, DocumentStatus::Processed);
        match outcome {
            IngestOutcome::Processed { chunk_count } => {
                assert!(chunk_count > 0);
                assert_eq!(loaded.chunk_count, Some(chunk_count));
                let stored = f.db.chunks_for_document(doc.id).unwrap();
                assert_eq!(stored.len() as u32, chunk_count);
                // Ordering is contiguous from zero
                for (i, chunk) in stored.iter().enumerate() {
                    assert_eq!(chunk.chunk_index, i as u32);
                }
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_binary_garbage_reaches_error() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let garbage: Vec<u8> = (0..512u32).map(|i| (i.wrapping_mul(197) >> 3) as u8).collect();
        let doc = upload(&f, owner, "application/octet-stream", &garbage).await;

        let outcome = f.pipeline.process(doc.id, owner).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Failed(IngestFailure::EmptyExtraction));

        let loaded = f.db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Error);
        assert_eq!(loaded.chunk_count, Some(0));
        assert!(f.db.chunks_for_document(doc.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_failure_reaches_error() {
        let db = Arc::new(DocumentDb::in_memory().unwrap());
        let pipeline = IngestPipeline::new(
            db.clone(),
            Arc::new(UnreachableStore),
            &NexusConfig::default(),
        );

        let owner = Uuid::new_v4();
        let doc = Document::new(
            owner,
            "lost.txt".to_string(),
            "text/plain".to_string(),
            10,
            format!("{}/lost.txt", owner),
        );
        db.insert_document(&doc).unwrap();

        let outcome = pipeline.process(doc.id, owner).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Failed(IngestFailure::Download));

        let loaded = db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Error);
        assert_eq!(loaded.chunk_count, None);
    }

    #[tokio::test]
    async fn test_unknown_or_foreign_document_is_not_found() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let doc = upload(&f, owner, "text/plain", b"private notes").await;

        // Unknown id
        let err = f.pipeline.process(Uuid::new_v4(), owner).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        // Wrong owner: NotFound and no state change
        let stranger = Uuid::new_v4();
        let err = f.pipeline.process(doc.id, stranger).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let loaded = f.db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Processing);
    }

    #[tokio::test]
    async fn test_reprocess_is_idempotent() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let body = "the quick brown fox jumps over the lazy dog ".repeat(100);
        let doc = upload(&f, owner, "text/plain", body.as_bytes()).await;

        f.pipeline.process(doc.id, owner).await.unwrap();
        let first = f.db.chunks_for_document(doc.id).unwrap();
        let first_count = f.db.get_document(doc.id, owner).unwrap().unwrap().chunk_count;

        f.db.mark_processing(doc.id).unwrap();
        f.pipeline.process(doc.id, owner).await.unwrap();
        let second = f.db.chunks_for_document(doc.id).unwrap();
        let second_count = f.db.get_document(doc.id, owner).unwrap().unwrap().chunk_count;

        assert_eq!(first, second);
        assert_eq!(first_count, second_count);
    }
}
