//! SQLite adapter for document and chunk persistence
//!
//! Stands in for the managed relational store; every read is scoped by the
//! owning user. Chunk replacement is transactional so a racing reprocess
//! resolves to a single writer's chunk set.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, Document, DocumentStatus};

/// Document + chunk store backed by SQLite
pub struct DocumentDb {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                name TEXT NOT NULL,
                media_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                storage_path TEXT NOT NULL,
                status TEXT NOT NULL,
                chunk_count INTEGER,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id);
            CREATE INDEX IF NOT EXISTS idx_documents_status ON documents(status);

            CREATE TABLE IF NOT EXISTS document_chunks (
                document_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                UNIQUE(document_id, chunk_index)
            );

            CREATE INDEX IF NOT EXISTS idx_document_chunks_document_id
                ON document_chunks(document_id);
        "#,
        )?;

        tracing::debug!("database migrations complete");
        Ok(())
    }

    /// Insert a new document row
    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO documents
                (id, owner_id, name, media_type, size_bytes, storage_path,
                 status, chunk_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                doc.id.to_string(),
                doc.owner_id.to_string(),
                doc.name,
                doc.media_type,
                doc.size_bytes as i64,
                doc.storage_path,
                doc.status.as_str(),
                doc.chunk_count,
                doc.created_at,
                doc.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Fetch a document, scoped to its owner. Not-owned rows are invisible.
    pub fn get_document(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let doc = conn
            .query_row(
                "SELECT id, owner_id, name, media_type, size_bytes, storage_path,
                        status, chunk_count, created_at, updated_at
                 FROM documents WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string()],
                row_to_document,
            )
            .optional()?;
        Ok(doc)
    }

    /// All documents for an owner, newest first
    pub fn list_documents(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, owner_id, name, media_type, size_bytes, storage_path,
                    status, chunk_count, created_at, updated_at
             FROM documents WHERE owner_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let docs = stmt
            .query_map(params![owner_id.to_string()], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    /// Reset a document to `processing` ahead of (re)ingestion
    pub fn mark_processing(&self, id: Uuid) -> Result<()> {
        self.set_status(id, DocumentStatus::Processing, KeepChunkCount::Keep)
    }

    /// Record a completed ingestion
    pub fn mark_processed(&self, id: Uuid, chunk_count: u32) -> Result<()> {
        self.set_status(
            id,
            DocumentStatus::Processed,
            KeepChunkCount::Set(Some(chunk_count)),
        )
    }

    /// Record a failed ingestion. `chunk_count` is Some(0) when extraction
    /// produced nothing, None when the failure happened before extraction.
    pub fn mark_error(&self, id: Uuid, chunk_count: Option<u32>) -> Result<()> {
        self.set_status(id, DocumentStatus::Error, KeepChunkCount::Set(chunk_count))
    }

    fn set_status(&self, id: Uuid, status: DocumentStatus, count: KeepChunkCount) -> Result<()> {
        let conn = self.conn.lock();
        match count {
            KeepChunkCount::Keep => {
                conn.execute(
                    "UPDATE documents SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![status.as_str(), Utc::now(), id.to_string()],
                )?;
            }
            KeepChunkCount::Set(value) => {
                conn.execute(
                    "UPDATE documents SET status = ?1, chunk_count = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![status.as_str(), value, Utc::now(), id.to_string()],
                )?;
            }
        }
        Ok(())
    }

    /// Replace a document's chunk set in one transaction.
    ///
    /// Deletes any existing chunks, then inserts the new set in batches of
    /// `batch_size`. A failed batch is logged and skipped rather than
    /// aborting the ingestion. Returns the number of rows inserted.
    pub fn replace_chunks(&self, document_id: Uuid, chunks: &[Chunk], batch_size: usize) -> Result<u32> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM document_chunks WHERE document_id = ?1",
            params![document_id.to_string()],
        )?;

        let mut inserted = 0u32;
        for batch in chunks.chunks(batch_size.max(1)) {
            let outcome: rusqlite::Result<()> = (|| {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO document_chunks (document_id, chunk_index, content)
                     VALUES (?1, ?2, ?3)",
                )?;
                for chunk in batch {
                    stmt.execute(params![
                        chunk.document_id.to_string(),
                        chunk.chunk_index,
                        chunk.content,
                    ])?;
                }
                Ok(())
            })();

            match outcome {
                Ok(()) => inserted += batch.len() as u32,
                Err(e) => {
                    tracing::warn!(
                        "chunk batch insert failed for document {}: {}, skipping batch",
                        document_id,
                        e
                    );
                }
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Chunks of an owner's processed documents, in insertion order, capped
    /// at `limit`. Each chunk carries its document's display name for
    /// citations.
    pub fn processed_chunks_for_owner(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<(Chunk, String)>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT c.document_id, c.chunk_index, c.content, d.name
             FROM document_chunks c
             JOIN documents d ON d.id = c.document_id
             WHERE d.owner_id = ?1 AND d.status = 'processed'
             ORDER BY c.rowid ASC
             LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![owner_id.to_string(), limit as i64], |row| {
                let document_id = parse_uuid(row, 0)?;
                let chunk_index: u32 = row.get(1)?;
                let content: String = row.get(2)?;
                let name: String = row.get(3)?;
                Ok((Chunk::new(document_id, chunk_index, content), name))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Stored chunks for one document, ordered by chunk_index
    pub fn chunks_for_document(&self, document_id: Uuid) -> Result<Vec<Chunk>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT document_id, chunk_index, content
             FROM document_chunks WHERE document_id = ?1
             ORDER BY chunk_index ASC",
        )?;
        let rows = stmt
            .query_map(params![document_id.to_string()], |row| {
                let document_id = parse_uuid(row, 0)?;
                let chunk_index: u32 = row.get(1)?;
                let content: String = row.get(2)?;
                Ok(Chunk::new(document_id, chunk_index, content))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete a document and its chunks. Owner-scoped; returns false when
    /// nothing matched.
    pub fn delete_document(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM document_chunks WHERE document_id = ?1",
            params![id.to_string()],
        )?;
        let deleted = tx.execute(
            "DELETE FROM documents WHERE id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner_id.to_string()],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}

/// Whether a status update also rewrites chunk_count
enum KeepChunkCount {
    Keep,
    Set(Option<u32>),
}

fn parse_uuid(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    let status_raw: String = row.get(6)?;
    let status = DocumentStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown status '{}'", status_raw).into(),
        )
    })?;
    let created_at: DateTime<Utc> = row.get(8)?;
    let updated_at: DateTime<Utc> = row.get(9)?;

    Ok(Document {
        id: parse_uuid(row, 0)?,
        owner_id: parse_uuid(row, 1)?,
        name: row.get(2)?,
        media_type: row.get(3)?,
        size_bytes: row.get::<_, i64>(4)? as u64,
        storage_path: row.get(5)?,
        status,
        chunk_count: row.get(7)?,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(owner_id: Uuid) -> Document {
        Document::new(
            owner_id,
            "notes.txt".to_string(),
            "text/plain".to_string(),
            64,
            format!("{}/notes.txt", owner_id),
        )
    }

    #[test]
    fn test_insert_and_get_owner_scoped() {
        let db = DocumentDb::in_memory().unwrap();
        let owner = Uuid::new_v4();
        let doc = sample_document(owner);
        db.insert_document(&doc).unwrap();

        let loaded = db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.status, DocumentStatus::Processing);

        // A different owner cannot see the row at all
        let stranger = Uuid::new_v4();
        assert!(db.get_document(doc.id, stranger).unwrap().is_none());
    }

    #[test]
    fn test_status_transitions() {
        let db = DocumentDb::in_memory().unwrap();
        let owner = Uuid::new_v4();
        let doc = sample_document(owner);
        db.insert_document(&doc).unwrap();

        db.mark_processed(doc.id, 7).unwrap();
        let loaded = db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Processed);
        assert_eq!(loaded.chunk_count, Some(7));

        db.mark_processing(doc.id).unwrap();
        let loaded = db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Processing);
        // chunk_count untouched while a reprocess is pending
        assert_eq!(loaded.chunk_count, Some(7));

        db.mark_error(doc.id, Some(0)).unwrap();
        let loaded = db.get_document(doc.id, owner).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Error);
        assert_eq!(loaded.chunk_count, Some(0));
    }

    #[test]
    fn test_replace_chunks_is_full_replacement() {
        let db = DocumentDb::in_memory().unwrap();
        let owner = Uuid::new_v4();
        let doc = sample_document(owner);
        db.insert_document(&doc).unwrap();

        let first: Vec<Chunk> = (0..5)
            .map(|i| Chunk::new(doc.id, i, format!("first pass {}", i)))
            .collect();
        assert_eq!(db.replace_chunks(doc.id, &first, 2).unwrap(), 5);

        let second: Vec<Chunk> = (0..3)
            .map(|i| Chunk::new(doc.id, i, format!("second pass {}", i)))
            .collect();
        assert_eq!(db.replace_chunks(doc.id, &second, 2).unwrap(), 3);

        let stored = db.chunks_for_document(doc.id).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0].content, "second pass 0");
        assert_eq!(
            stored.iter().map(|c| c.chunk_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_processed_chunks_join_and_bound() {
        let db = DocumentDb::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let mut processed = sample_document(owner);
        processed.name = "report.txt".to_string();
        db.insert_document(&processed).unwrap();
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| Chunk::new(processed.id, i, format!("chunk {}", i)))
            .collect();
        db.replace_chunks(processed.id, &chunks, 100).unwrap();
        db.mark_processed(processed.id, 10).unwrap();

        // Still-processing documents must not contribute candidates
        let pending = sample_document(owner);
        db.insert_document(&pending).unwrap();
        db.replace_chunks(pending.id, &[Chunk::new(pending.id, 0, "draft".into())], 100)
            .unwrap();

        let rows = db.processed_chunks_for_owner(owner, 4).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|(c, name)| {
            c.document_id == processed.id && name == "report.txt"
        }));
        // Insertion order preserved
        assert_eq!(rows[0].0.chunk_index, 0);
        assert_eq!(rows[3].0.chunk_index, 3);
    }

    #[test]
    fn test_delete_document_cascades() {
        let db = DocumentDb::in_memory().unwrap();
        let owner = Uuid::new_v4();
        let doc = sample_document(owner);
        db.insert_document(&doc).unwrap();
        db.replace_chunks(doc.id, &[Chunk::new(doc.id, 0, "body".into())], 100)
            .unwrap();

        // Wrong owner cannot delete
        assert!(!db.delete_document(doc.id, Uuid::new_v4()).unwrap());
        assert!(db.get_document(doc.id, owner).unwrap().is_some());

        assert!(db.delete_document(doc.id, owner).unwrap());
        assert!(db.get_document(doc.id, owner).unwrap().is_none());
        assert!(db.chunks_for_document(doc.id).unwrap().is_empty());
    }

    #[test]
    fn test_list_documents_newest_first() {
        let db = DocumentDb::in_memory().unwrap();
        let owner = Uuid::new_v4();

        let mut older = sample_document(owner);
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        db.insert_document(&older).unwrap();

        let newer = sample_document(owner);
        db.insert_document(&newer).unwrap();

        let listed = db.list_documents(owner).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }
}
