//! Core data types

pub mod chat;
pub mod document;

pub use chat::{ChatMessage, ChatRequest, Intent, IntentCategory, RetrievedChunk, Role};
pub use document::{Chunk, Document, DocumentStatus};
