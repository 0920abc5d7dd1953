//! HTTP client for an OpenAI-compatible completion gateway

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::types::ChatMessage;

use super::completion::{CompletionProvider, TokenStream};

/// Completion gateway client speaking the chat-completions wire format
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    async fn send_request(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response> {
        let body = json!({
            "model": self.model,
            "messages": messages
                .iter()
                .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
                .collect::<Vec<_>>(),
            "temperature": self.temperature,
            "stream": stream,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("gateway error {}: {}", status, detail);
            return Err(match status.as_u16() {
                429 => Error::RateLimited,
                402 => Error::QuotaExhausted,
                _ => Error::Gateway(format!("status {}", status)),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for GatewayClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<TokenStream> {
        let response = self.send_request(messages, true).await?;

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String>>(256);

        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            'outer: while let Some(next) = bytes.next().await {
                let chunk = match next {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(Error::Gateway(e.to_string()))).await;
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].to_string();
                    buffer.drain(..=pos);

                    match parse_stream_line(&line) {
                        StreamEvent::Token(token) => {
                            if tx.send(Ok(token)).await.is_err() {
                                break 'outer;
                            }
                        }
                        StreamEvent::Done => break 'outer,
                        StreamEvent::Skip => {}
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }

    async fn complete_text(&self, messages: &[ChatMessage]) -> Result<String> {
        let response = self.send_request(messages, false).await?;
        let reply: CompletionReply = response
            .json()
            .await
            .map_err(|e| Error::Gateway(format!("malformed response: {}", e)))?;

        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Gateway("empty response".to_string()))
    }

    fn name(&self) -> &str {
        "gateway"
    }
}

/// One parsed line of an event-stream body
#[derive(Debug, PartialEq)]
enum StreamEvent {
    /// A content token to forward
    Token(String),
    /// End-of-stream marker
    Done,
    /// Comment, keep-alive, empty delta, or unparseable line
    Skip,
}

fn parse_stream_line(line: &str) -> StreamEvent {
    let line = line.trim();
    let Some(payload) = line.strip_prefix("data:") else {
        return StreamEvent::Skip;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return StreamEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .unwrap_or_default();
            if content.is_empty() {
                StreamEvent::Skip
            } else {
                StreamEvent::Token(content)
            }
        }
        Err(_) => StreamEvent::Skip,
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}
