//! Chat request and retrieval/intent types

use serde::{Deserialize, Serialize};

/// Chat participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Wire form expected by OpenAI-compatible gateways
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat turn request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Optional conversation handle, echoed through for clients that track it
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// A chunk selected as grounding context for one chat turn. Ephemeral.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    /// Chunk text
    pub content: String,
    /// Display name of the owning document, for citations
    pub document_name: String,
    /// Position within the owning document
    pub chunk_index: u32,
    /// Number of distinct query tokens the chunk matched
    pub score: usize,
}

/// Closed set of intent categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    /// User wants to know something
    InformationQuery,
    /// User wants an action performed
    TaskExecution,
    /// User needs help making a decision
    DecisionSupport,
    /// Fallback when classification is unavailable or ambiguous
    General,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InformationQuery => "information_query",
            Self::TaskExecution => "task_execution",
            Self::DecisionSupport => "decision_support",
            Self::General => "general",
        }
    }

    /// Parse gateway output leniently; classifier replies vary in casing
    /// and separator style.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "information_query" | "informational" => Some(Self::InformationQuery),
            "task_execution" | "task" => Some(Self::TaskExecution),
            "decision_support" | "decision" => Some(Self::DecisionSupport),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

/// Classification of a user turn. Ephemeral, produced once per turn.
#[derive(Debug, Clone, Serialize)]
pub struct Intent {
    pub category: IntentCategory,
    /// In [0, 1]
    pub confidence: f32,
    pub description: String,
    pub suggested_action: Option<String>,
}

impl Intent {
    /// Fallback intent used whenever classification fails
    pub fn general() -> Self {
        Self {
            category: IntentCategory::General,
            confidence: 0.5,
            description: "General conversation".to_string(),
            suggested_action: None,
        }
    }
}
