//! Anthropic native provider implementation.
//!
//! Uses the Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks
//! - Streaming via SSE, forwarded as typed [`StreamEvent`]s
//!
//! Any endpoint speaking the same protocol works through `with_base_url`.

use crate::sse::{SseBuffer, parse_event};
use async_trait::async_trait;
use docent_core::error::ProviderError;
use docent_core::message::{ContentBlock, ConversationEntry, Role};
use docent_core::provider::{EventReceiver, Provider, ProviderRequest, StreamEvent};
use docent_core::tool::ToolDescriptor;
use futures::StreamExt;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given per-call timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Point at a different endpoint (a proxy, a compatible vendor, a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert the interaction log to Messages API format.
    ///
    /// Assistant turns are replayed block for block, reasoning and unknown
    /// block kinds included. Turns with no content are skipped since the
    /// endpoint rejects empty assistant messages.
    fn to_api_messages(entries: &[ConversationEntry]) -> Vec<AnthropicMessage> {
        let mut result = Vec::with_capacity(entries.len());

        for entry in entries {
            match entry {
                ConversationEntry::UserText { text } => {
                    result.push(AnthropicMessage {
                        role: entry.role(),
                        content: AnthropicContent::Text(text.clone()),
                    });
                }
                ConversationEntry::AssistantTurn { message, .. } => {
                    if message.content.is_empty() {
                        continue;
                    }
                    let blocks: Vec<ReplayBlock> = message
                        .content
                        .iter()
                        .map(|block| match block {
                            ContentBlock::Text { text } => {
                                ApiBlock::Text { text: text.clone() }.into()
                            }
                            ContentBlock::ToolUse { id, name, input } => ApiBlock::ToolUse {
                                id: id.clone(),
                                name: name.clone(),
                                input: input.clone(),
                            }
                            .into(),
                            ContentBlock::Thinking {
                                thinking,
                                signature,
                            } => ApiBlock::Thinking {
                                thinking: thinking.clone(),
                                signature: signature.clone(),
                            }
                            .into(),
                            ContentBlock::Opaque { block } => ReplayBlock::Raw(block.clone()),
                        })
                        .collect();
                    result.push(AnthropicMessage {
                        role: entry.role(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                ConversationEntry::ToolResultBatch { results } => {
                    // One user message carrying every result of the turn
                    let blocks: Vec<ReplayBlock> = results
                        .iter()
                        .map(|r| {
                            ApiBlock::ToolResult {
                                tool_use_id: r.request_id.clone(),
                                content: r.content.clone(),
                            }
                            .into()
                        })
                        .collect();
                    result.push(AnthropicMessage {
                        role: entry.role(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
            }
        }

        result
    }

    /// Convert tool descriptors to Anthropic format.
    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<AnthropicTool<'_>> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.input_schema,
            })
            .collect()
    }

    fn build_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "max_tokens": request.max_tokens,
            "stream": true,
        });

        if !request.system.is_empty() {
            body["system"] = serde_json::json!(request.system);
        }
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }
        if let Some(t) = request.temperature {
            body["temperature"] = serde_json::json!(t);
        }

        body
    }

    fn map_send_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: ProviderRequest) -> Result<EventReceiver, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = SseBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for data in buffer.push(&bytes) {
                    let event = parse_event(&data);
                    let done = matches!(event, Ok(StreamEvent::MessageStop) | Err(_));
                    if tx.send(event).await.is_err() || done {
                        return;
                    }
                }
            }

            // Body ended without message_stop; the decoder treats end of
            // channel as end of turn.
            debug!("Anthropic stream closed without message_stop");
        });

        Ok(rx)
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: Role,
    content: AnthropicContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ReplayBlock>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ReplayBlock {
    Typed(ApiBlock),
    /// A block kind we do not model, sent back exactly as received
    Raw(serde_json::Value),
}

impl From<ApiBlock> for ReplayBlock {
    fn from(block: ApiBlock) -> Self {
        Self::Typed(block)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    Thinking {
        thinking: String,
        signature: String,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::message::{AssistantMessage, ToolResult};
    use docent_core::tool::empty_object_schema;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new("sk-ant-test", Duration::from_secs(5)).unwrap()
    }

    fn request(messages: Vec<ConversationEntry>) -> ProviderRequest {
        ProviderRequest {
            model: "claude-sonnet-4-20250514".into(),
            system: "Answer from the documentation.".into(),
            messages,
            tools: vec![ToolDescriptor {
                name: "read_sbatch_doc".into(),
                description: "Batch job submission".into(),
                input_schema: empty_object_schema(),
            }],
            max_tokens: 8192,
            temperature: None,
        }
    }

    #[test]
    fn constructor() {
        let provider = provider();
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider = provider().with_base_url("https://api.minimax.io/anthropic/");
        assert_eq!(provider.base_url(), "https://api.minimax.io/anthropic");
    }

    #[test]
    fn message_conversion_user_text() {
        let api_msgs = AnthropicProvider::to_api_messages(&[ConversationEntry::user("Hello")]);
        let json = serde_json::to_value(&api_msgs).unwrap();
        assert_eq!(json[0]["role"], "user");
        assert_eq!(json[0]["content"], "Hello");
    }

    #[test]
    fn message_conversion_replays_assistant_blocks() {
        let turn = ConversationEntry::assistant(AssistantMessage {
            content: vec![
                ContentBlock::Text {
                    text: "Let me check".into(),
                },
                ContentBlock::ToolUse {
                    id: "toolu_123".into(),
                    name: "read_sbatch_doc".into(),
                    input: serde_json::json!({}),
                },
            ],
        });

        let json = serde_json::to_value(AnthropicProvider::to_api_messages(&[turn])).unwrap();
        assert_eq!(json[0]["role"], "assistant");
        let blocks = json[0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "text");
        assert_eq!(blocks[0]["text"], "Let me check");
        assert_eq!(blocks[1]["type"], "tool_use");
        assert_eq!(blocks[1]["id"], "toolu_123");
        assert_eq!(blocks[1]["input"], serde_json::json!({}));
    }

    #[test]
    fn message_conversion_replays_thinking_and_unknown_blocks() {
        let redacted = serde_json::json!({"type": "redacted_thinking", "data": "EmwKAhgB"});
        let turn = ConversationEntry::assistant(AssistantMessage {
            content: vec![
                ContentBlock::Thinking {
                    thinking: "The sbatch page covers limits.".into(),
                    signature: "EqQBCkgIAR".into(),
                },
                ContentBlock::Opaque {
                    block: redacted.clone(),
                },
                ContentBlock::ToolUse {
                    id: "toolu_1".into(),
                    name: "read_sbatch_doc".into(),
                    input: serde_json::json!({}),
                },
            ],
        });

        let json = serde_json::to_value(AnthropicProvider::to_api_messages(&[turn])).unwrap();
        let blocks = json[0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[0],
            serde_json::json!({
                "type": "thinking",
                "thinking": "The sbatch page covers limits.",
                "signature": "EqQBCkgIAR"
            })
        );
        assert_eq!(blocks[1], redacted);
        assert_eq!(blocks[2]["type"], "tool_use");
    }

    #[test]
    fn message_conversion_batches_tool_results() {
        let batch = ConversationEntry::ToolResultBatch {
            results: vec![
                ToolResult::new("toolu_1", "first document"),
                ToolResult::new("toolu_2", "Unknown tool: read_nonexistent_doc"),
            ],
        };

        let json = serde_json::to_value(AnthropicProvider::to_api_messages(&[batch])).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["role"], "user"); // Tool results go as user messages
        let blocks = json[0]["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0]["type"], "tool_result");
        assert_eq!(blocks[0]["tool_use_id"], "toolu_1");
        assert_eq!(blocks[1]["content"], "Unknown tool: read_nonexistent_doc");
    }

    #[test]
    fn message_conversion_skips_empty_assistant_turns() {
        let entries = vec![
            ConversationEntry::user("q"),
            ConversationEntry::assistant(AssistantMessage::default()),
            ConversationEntry::user("again"),
        ];
        let api_msgs = AnthropicProvider::to_api_messages(&entries);
        assert_eq!(api_msgs.len(), 2);
        assert!(api_msgs.iter().all(|m| m.role == Role::User));
    }

    #[test]
    fn request_body_shape() {
        let body = AnthropicProvider::build_body(&request(vec![ConversationEntry::user("hi")]));
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["system"], "Answer from the documentation.");
        assert_eq!(body["tools"][0]["name"], "read_sbatch_doc");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn request_body_includes_temperature_when_set() {
        let mut req = request(vec![ConversationEntry::user("hi")]);
        req.temperature = Some(0.2);
        req.tools.clear();
        let body = AnthropicProvider::build_body(&req);
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(body.get("tools").is_none());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let provider = provider().with_base_url("http://127.0.0.1:1");
        let err = provider
            .stream(request(vec![ConversationEntry::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Network(_) | ProviderError::Timeout(_)
        ));
    }
}
