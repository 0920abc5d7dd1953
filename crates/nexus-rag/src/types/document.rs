//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Ingestion pending or running
    Processing,
    /// Chunks persisted, document searchable
    Processed,
    /// Ingestion failed; a reprocess request is the recovery path
    Error,
}

impl DocumentStatus {
    /// Stable string form used in the database and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }

    /// Parse the stable string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(Self::Processing),
            "processed" => Some(Self::Processed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded artifact. Visible only to its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Owning user
    pub owner_id: Uuid,
    /// Display name (original filename), used in citations
    pub name: String,
    /// Declared media type
    pub media_type: String,
    /// Upload size in bytes
    pub size_bytes: u64,
    /// Location of the raw bytes in object storage
    pub storage_path: String,
    /// Lifecycle state
    pub status: DocumentStatus,
    /// Number of chunks produced by the last successful ingestion;
    /// None until first processed, 0 on extraction failure
    pub chunk_count: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document record in `processing` state
    pub fn new(
        owner_id: Uuid,
        name: String,
        media_type: String,
        size_bytes: u64,
        storage_path: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            media_type,
            size_bytes,
            storage_path,
            status: DocumentStatus::Processing,
            chunk_count: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A contiguous slice of a document's extracted text.
///
/// chunk_index is zero-based and contiguous within one ingestion pass; the
/// whole set is replaced on every (re)ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Owning document
    pub document_id: Uuid,
    /// Position within the document's chunk sequence
    pub chunk_index: u32,
    /// Trimmed text content
    pub content: String,
}

impl Chunk {
    pub fn new(document_id: Uuid, chunk_index: u32, content: String) -> Self {
        Self {
            document_id,
            chunk_index,
            content,
        }
    }
}
