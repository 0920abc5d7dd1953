//! Chat endpoint: intent classification, retrieval, streamed completion

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use futures_util::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::server::auth::OwnerId;
use crate::server::state::AppState;
use crate::types::{ChatMessage, ChatRequest, Role};

/// POST /api/chat - answer a chat turn as a token event stream.
///
/// Classification and retrieval happen before the stream opens; their
/// results ride on response headers so the client can render intent and
/// citation hints alongside the streamed answer.
pub async fn chat(
    State(state): State<AppState>,
    Extension(OwnerId(owner_id)): Extension<OwnerId>,
    Json(request): Json<ChatRequest>,
) -> Result<Response> {
    let server = &state.config().server;
    let latest = validate_chat_request(&request, server.max_chat_messages, server.max_message_chars)?;

    tracing::info!(
        "chat turn for {}: {} messages",
        owner_id,
        request.messages.len()
    );

    let intent = state.classifier().classify(&latest.content).await;
    tracing::debug!(
        "intent: {} ({:.2})",
        intent.category.as_str(),
        intent.confidence
    );

    let retrieved = state.retriever().retrieve(owner_id, &latest.content)?;
    let sources = PromptBuilder::source_names(&retrieved);

    let messages = PromptBuilder::build_messages(&request.messages, &retrieved, &intent);
    let tokens = state.completion().complete(&messages).await?;

    let events = tokens
        .map(|item| -> std::result::Result<Event, Infallible> {
            match item {
                Ok(token) => Ok(Event::default().data(token)),
                Err(e) => Ok(Event::default().event("error").data(e.to_string())),
            }
        })
        .chain(futures_util::stream::once(async {
            Ok(Event::default().data("[DONE]"))
        }));

    let sse = Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    );

    let mut response = sse.into_response();
    let headers = response.headers_mut();
    insert_header(headers, "x-intent-type", intent.category.as_str());
    insert_header(headers, "x-intent-confidence", &format!("{:.2}", intent.confidence));
    if !sources.is_empty() {
        match serde_json::to_string(&sources) {
            Ok(json) => insert_header(headers, "x-rag-sources", &json),
            Err(e) => tracing::warn!("could not encode source list: {}", e),
        }
    }

    Ok(response)
}

/// Reject malformed chat payloads; returns the latest message on success
fn validate_chat_request(
    request: &ChatRequest,
    max_messages: usize,
    max_message_chars: usize,
) -> Result<&ChatMessage> {
    if request.messages.is_empty() {
        return Err(Error::Validation("No messages provided".to_string()));
    }
    if request.messages.len() > max_messages {
        return Err(Error::Validation(format!(
            "Too many messages (max {})",
            max_messages
        )));
    }
    for (i, message) in request.messages.iter().enumerate() {
        if message.content.chars().count() > max_message_chars {
            return Err(Error::Validation(format!(
                "Message {} exceeds {} characters",
                i, max_message_chars
            )));
        }
    }

    let latest = request
        .messages
        .last()
        .ok_or_else(|| Error::Validation("No messages provided".to_string()))?;
    if latest.role != Role::User {
        return Err(Error::Validation(
            "Last message must be from the user".to_string(),
        ));
    }
    Ok(latest)
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => tracing::warn!("skipping header {}: value not representable", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            messages,
            conversation_id: None,
        }
    }

    #[test]
    fn test_valid_request_returns_latest() {
        let req = request(vec![
            ChatMessage::new(Role::User, "first"),
            ChatMessage::new(Role::Assistant, "reply"),
            ChatMessage::new(Role::User, "second"),
        ]);
        let latest = validate_chat_request(&req, 50, 10_000).unwrap();
        assert_eq!(latest.content, "second");
    }

    #[test]
    fn test_empty_request_rejected() {
        let req = request(vec![]);
        assert!(matches!(
            validate_chat_request(&req, 50, 10_000),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_too_many_messages_rejected() {
        let messages = (0..51)
            .map(|i| ChatMessage::new(Role::User, format!("msg {}", i)))
            .collect();
        let req = request(messages);
        assert!(matches!(
            validate_chat_request(&req, 50, 10_000),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_oversized_message_rejected() {
        let req = request(vec![ChatMessage::new(Role::User, "x".repeat(10_001))]);
        assert!(matches!(
            validate_chat_request(&req, 50, 10_000),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_last_message_must_be_user() {
        let req = request(vec![
            ChatMessage::new(Role::User, "hello"),
            ChatMessage::new(Role::Assistant, "hi there"),
        ]);
        assert!(matches!(
            validate_chat_request(&req, 50, 10_000),
            Err(Error::Validation(_))
        ));
    }
}
