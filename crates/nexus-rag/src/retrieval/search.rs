//! Lexical chunk retrieval
//!
//! Relevance is literal token overlap: cheap, no embedding infrastructure,
//! and good enough for grounding short factual answers. The interface is
//! deliberately narrow so a similarity-based retriever can slot in without
//! touching any other component.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::storage::DocumentDb;
use crate::types::RetrievedChunk;

/// Scores an owner's processed chunks against a query
pub struct LexicalRetriever {
    db: Arc<DocumentDb>,
    /// Results returned per query
    top_k: usize,
    /// Chunks loaded for scoring per query
    scan_limit: usize,
    /// Query tokens of this length or shorter are discarded
    min_token_len: usize,
}

impl LexicalRetriever {
    pub fn new(db: Arc<DocumentDb>, config: &RetrievalConfig) -> Self {
        Self {
            db,
            top_k: config.top_k,
            scan_limit: config.scan_limit,
            min_token_len: config.min_token_len,
        }
    }

    /// Return up to `top_k` chunks from the owner's processed documents,
    /// ranked by the number of distinct query tokens each contains.
    /// Zero-score chunks are never returned; ties keep insertion order.
    pub fn retrieve(&self, owner_id: Uuid, query: &str) -> Result<Vec<RetrievedChunk>> {
        let tokens = self.tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.db.processed_chunks_for_owner(owner_id, self.scan_limit)?;

        let mut scored: Vec<RetrievedChunk> = candidates
            .into_iter()
            .filter_map(|(chunk, document_name)| {
                let haystack = chunk.content.to_lowercase();
                let score = tokens.iter().filter(|t| haystack.contains(t.as_str())).count();
                (score > 0).then(|| RetrievedChunk {
                    content: chunk.content,
                    document_name,
                    chunk_index: chunk.chunk_index,
                    score,
                })
            })
            .collect();

        // Stable sort: equal scores keep their insertion order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(self.top_k);

        tracing::debug!(
            "retrieval matched {} chunks for {} query tokens",
            scored.len(),
            tokens.len()
        );

        Ok(scored)
    }

    /// Whitespace tokenization, lowercased, with short noise tokens dropped
    fn tokenize(&self, query: &str) -> Vec<String> {
        query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| t.len() > self.min_token_len)
            .collect()
    }
}
