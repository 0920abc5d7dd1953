//! nexus-rag: document ingestion and keyword-retrieval backend for a
//! RAG chat assistant
//!
//! Uploaded files become bounded plain text, then overlapping chunks in the
//! document store; chat turns score those chunks lexically and stream a
//! grounded completion from an external gateway, with intent classification
//! riding alongside.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod intent;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::NexusConfig;
pub use error::{Error, Result};
pub use types::{
    chat::{ChatMessage, ChatRequest, Intent, IntentCategory, RetrievedChunk, Role},
    document::{Chunk, Document, DocumentStatus},
};
