//! Configuration for the assistant backend

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Main configuration, loadable from a TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NexusConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Caller authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Data directory layout
    #[serde(default)]
    pub storage: StorageConfig,
    /// Text extraction bounds
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Completion gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Background processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl NexusConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Maximum number of messages per chat request
    pub max_chat_messages: usize,
    /// Maximum characters per chat message
    pub max_message_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024, // 50MB
            max_chat_messages: 50,
            max_message_chars: 10_000,
        }
    }
}

/// Caller authentication.
///
/// Authentication itself is an external concern; this maps bearer tokens to
/// owner ids the way the hosted auth service would resolve them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token -> owner id
    #[serde(default)]
    pub tokens: HashMap<String, Uuid>,
}

/// Data directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base data directory
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nexus-rag");
        Self { data_dir }
    }
}

impl StorageConfig {
    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("nexus.db")
    }

    /// Root directory for uploaded objects
    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir.join("objects")
    }
}

/// Text extraction bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Input bytes considered before extraction gives up (default: 500KB)
    pub max_input_bytes: usize,
    /// Maximum characters of extracted text (default: 50_000)
    pub max_output_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 500 * 1024,
            max_output_chars: 50_000,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
    /// Upper bound on chunks per document; the earliest chunks are kept
    pub max_chunks: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            max_chunks: 1000,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks returned per query (default: 5)
    pub top_k: usize,
    /// Maximum chunks loaded for scoring per query (default: 100)
    pub scan_limit: usize,
    /// Query tokens of this length or shorter are discarded
    pub min_token_len: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            scan_limit: 100,
            min_token_len: 3,
        }
    }
}

/// Completion gateway configuration (OpenAI-compatible chat completions API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Gateway base URL
    pub base_url: String,
    /// API key sent as a bearer token; empty means no auth header
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: String::new(),
            model: "phi3".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of ingestion workers (default: CPU count, max 4)
    pub worker_count: Option<usize>,
    /// Hard bound on a single ingestion run in seconds; on expiry the
    /// document is forced to error status (default: 300)
    pub ingest_timeout_secs: u64,
    /// Chunk rows per insert batch (default: 100)
    pub insert_batch_size: usize,
    /// Capacity of the ingestion queue
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            ingest_timeout_secs: 300,
            insert_batch_size: 100,
            queue_capacity: 1000,
        }
    }
}
