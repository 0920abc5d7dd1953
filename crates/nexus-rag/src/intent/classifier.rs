//! LLM-backed intent classification
//!
//! Classification rides on the completion gateway and must never block a
//! chat turn: every failure path collapses to the general intent at 0.5.

use serde::Deserialize;
use std::sync::Arc;

use crate::providers::CompletionProvider;
use crate::types::{ChatMessage, Intent, IntentCategory, Role};

const CLASSIFY_INSTRUCTIONS: &str = r#"Classify the user's message into exactly one category:
- information_query: the user wants to know something
- task_execution: the user wants an action performed
- decision_support: the user needs help making a decision
- general: anything else

Respond with a JSON object and nothing else:
{"category": "<category>", "confidence": <0.0-1.0>, "description": "<one sentence>", "suggested_action": "<action or null>"}"#;

/// Classifies a user turn via the completion gateway
pub struct IntentClassifier {
    provider: Arc<dyn CompletionProvider>,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Classify a message. Infallible by design: any gateway or parse
    /// failure yields the general fallback.
    pub async fn classify(&self, message: &str) -> Intent {
        let messages = vec![
            ChatMessage::new(Role::System, CLASSIFY_INSTRUCTIONS),
            ChatMessage::new(Role::User, message),
        ];

        let reply = match self.provider.complete_text(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("intent classification failed: {}", e);
                return Intent::general();
            }
        };

        parse_intent_reply(&reply).unwrap_or_else(|| {
            tracing::warn!("could not parse intent reply: {:?}", reply);
            Intent::general()
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    category: Option<String>,
    confidence: Option<f32>,
    description: Option<String>,
    suggested_action: Option<String>,
}

/// Parse the classifier's reply permissively: models wrap JSON in prose and
/// code fences, so take the first balanced object found anywhere in the
/// text.
fn parse_intent_reply(reply: &str) -> Option<Intent> {
    let block = first_json_block(reply)?;
    let raw: RawIntent = serde_json::from_str(block).ok()?;

    let category = IntentCategory::parse(raw.category.as_deref()?)?;
    let confidence = raw.confidence.unwrap_or(0.5).clamp(0.0, 1.0);

    Some(Intent {
        category,
        confidence,
        description: raw
            .description
            .unwrap_or_else(|| "Unclassified".to_string()),
        suggested_action: raw.suggested_action.filter(|s| !s.is_empty()),
    })
}

/// First balanced `{...}` block in the text, if any
fn first_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::providers::TokenStream;
    use async_trait::async_trait;

    struct CannedProvider {
        reply: Result<String>,
    }

    impl CannedProvider {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(Error::Gateway("down".to_string())),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        async fn complete(&self, _messages: &[crate::types::ChatMessage]) -> Result<TokenStream> {
            Err(Error::Gateway("streaming not used here".to_string()))
        }

        async fn complete_text(&self, _messages: &[crate::types::ChatMessage]) -> Result<String> {
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(Error::Gateway("down".to_string())),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    async fn classify_with(reply: &str) -> Intent {
        IntentClassifier::new(Arc::new(CannedProvider::ok(reply)))
            .classify("schedule a meeting for tomorrow")
            .await
    }

    #[tokio::test]
    async fn test_clean_json_reply() {
        let intent = classify_with(
            r#"{"category": "task_execution", "confidence": 0.92, "description": "Wants a meeting scheduled", "suggested_action": "schedule_meeting"}"#,
        )
        .await;
        assert_eq!(intent.category, IntentCategory::TaskExecution);
        assert!((intent.confidence - 0.92).abs() < 1e-6);
        assert_eq!(intent.suggested_action.as_deref(), Some("schedule_meeting"));
    }

    #[tokio::test]
    async fn test_json_wrapped_in_prose_and_fences() {
        let intent = classify_with(
            "Sure! Here's the classification:\n```json\n{\"category\": \"information_query\", \"confidence\": 0.8, \"description\": \"A question\", \"suggested_action\": null}\n```\nLet me know if you need more.",
        )
        .await;
        assert_eq!(intent.category, IntentCategory::InformationQuery);
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let intent = classify_with("I think this is probably a question?").await;
        assert_eq!(intent.category, IntentCategory::General);
        assert!((intent.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_unknown_category_falls_back() {
        let intent =
            classify_with(r#"{"category": "prophecy", "confidence": 0.9, "description": "?"}"#)
                .await;
        assert_eq!(intent.category, IntentCategory::General);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let intent = IntentClassifier::new(Arc::new(CannedProvider::failing()))
            .classify("hello")
            .await;
        assert_eq!(intent.category, IntentCategory::General);
        assert!((intent.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_confidence_clamped() {
        let intent = classify_with(
            r#"{"category": "general", "confidence": 7.5, "description": "overconfident"}"#,
        )
        .await;
        assert!(intent.confidence <= 1.0);
    }

    #[test]
    fn test_first_json_block_nested() {
        let text = r#"prefix {"a": {"b": 1}, "c": "}"} suffix"#;
        assert_eq!(first_json_block(text), Some(r#"{"a": {"b": 1}, "c": "}"}"#));
    }
}
