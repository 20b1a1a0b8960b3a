//! Server-sent event framing and Messages API event parsing.
//!
//! Bytes arrive in arbitrary chunks; [`SseBuffer`] cuts them into complete
//! lines (a multi-byte character split across chunks is reassembled before
//! decoding) and yields each `data:` payload. [`parse_event`] turns one
//! payload into a typed [`StreamEvent`].

use docent_core::error::ProviderError;
use docent_core::provider::{BlockDelta, BlockStart, StreamEvent};
use serde::Deserialize;
use tracing::trace;

/// Line buffer for an SSE byte stream.
#[derive(Debug, Default)]
pub struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the `data:` payloads of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            // Comments, blank separators and `event:` names carry nothing the
            // JSON payload does not repeat in its `type` field.
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if !data.is_empty() {
                    payloads.push(data.to_string());
                }
            }
        }
        payloads
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SseEvent {
    ContentBlockStart {
        index: usize,
        content_block: SseBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: SseDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageStop,
    Error {
        error: SseError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SseBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
        #[serde(default)]
        signature: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SseDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    ThinkingDelta {
        thinking: String,
    },
    SignatureDelta {
        signature: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct SseError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

fn type_of(value: &serde_json::Value) -> String {
    value["type"].as_str().unwrap_or("unknown").to_string()
}

/// Parse one `data:` payload.
///
/// Unparseable payloads and unknown kinds become [`StreamEvent::Other`]; only
/// an explicit `error` event from the endpoint is reported as a failure.
pub fn parse_event(data: &str) -> Result<StreamEvent, ProviderError> {
    let raw: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, data = %data, "Ignoring unparseable SSE payload");
            return Ok(StreamEvent::Other {
                kind: "malformed".into(),
            });
        }
    };
    let kind = type_of(&raw);

    let event = match serde_json::from_value::<SseEvent>(raw.clone()) {
        Ok(event) => event,
        Err(e) => {
            trace!(error = %e, kind = %kind, "SSE payload did not match its declared shape");
            return Ok(StreamEvent::Other { kind });
        }
    };

    Ok(match event {
        SseEvent::ContentBlockStart {
            index,
            content_block,
        } => {
            let block = match content_block {
                SseBlock::Text { text } => BlockStart::Text { text },
                SseBlock::ToolUse { id, name } => BlockStart::ToolUse { id, name },
                SseBlock::Thinking {
                    thinking,
                    signature,
                } => BlockStart::Thinking {
                    thinking,
                    signature,
                },
                SseBlock::Unknown => BlockStart::Other {
                    kind: type_of(&raw["content_block"]),
                    block: raw["content_block"].clone(),
                },
            };
            StreamEvent::BlockStart { index, block }
        }
        SseEvent::ContentBlockDelta { index, delta } => {
            let delta = match delta {
                SseDelta::TextDelta { text } => BlockDelta::Text(text),
                SseDelta::InputJsonDelta { partial_json } => BlockDelta::ToolArguments(partial_json),
                SseDelta::ThinkingDelta { thinking } => BlockDelta::Thinking(thinking),
                SseDelta::SignatureDelta { signature } => BlockDelta::Signature(signature),
                SseDelta::Unknown => BlockDelta::Other {
                    kind: type_of(&raw["delta"]),
                },
            };
            StreamEvent::BlockDelta { index, delta }
        }
        SseEvent::ContentBlockStop { index } => StreamEvent::BlockStop { index },
        SseEvent::MessageStop => StreamEvent::MessageStop,
        SseEvent::Error { error } => {
            return Err(match error.kind.as_str() {
                "rate_limit_error" => ProviderError::RateLimited {
                    retry_after_secs: 5,
                },
                "authentication_error" => ProviderError::AuthenticationFailed(error.message),
                _ => ProviderError::StreamInterrupted(format!("{}: {}", error.kind, error.message)),
            });
        }
        SseEvent::Unknown => StreamEvent::Other { kind },
    })
}
