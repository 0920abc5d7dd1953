//! Completion provider trait
//!
//! The hosted LLM gateway is an opaque capability: the service hands it a
//! message list and reads back either a token stream (chat turns) or a
//! single text (intent classification). Any text-generation backend can sit
//! behind this trait.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::types::ChatMessage;

/// Stream of completion tokens
pub type TokenStream = BoxStream<'static, Result<String>>;

/// Trait for the external completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Stream a chat completion token by token
    async fn complete(&self, messages: &[ChatMessage]) -> Result<TokenStream>;

    /// Run a completion to a single buffered text (used by the classifier)
    async fn complete_text(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
