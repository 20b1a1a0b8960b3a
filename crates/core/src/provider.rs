//! Provider trait — the abstraction over streaming model endpoints.
//!
//! A provider takes the full conversation plus the tool registry and returns
//! a channel of typed [`StreamEvent`]s for one model turn. Each call carries
//! the complete context: providers keep no session memory between calls.

use crate::error::ProviderError;
use crate::message::ConversationEntry;
use crate::tool::ToolDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g. "claude-sonnet-4-20250514")
    pub model: String,

    /// System prompt, sent as a top-level field
    pub system: String,

    /// The full interaction log
    pub messages: Vec<ConversationEntry>,

    /// Tools the model may request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Payload of a block-start event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockStart {
    /// A text block, possibly with initial text.
    Text { text: String },
    /// A tool invocation block.
    ToolUse { id: String, name: String },
    /// Model reasoning. Replayed with its signature.
    Thinking { thinking: String, signature: String },
    /// Any other block kind, kept as sent so it can be replayed.
    Other {
        kind: String,
        block: serde_json::Value,
    },
}

/// Payload of a block-delta event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockDelta {
    /// A piece of visible text.
    Text(String),
    /// A fragment of a tool invocation's JSON arguments.
    ToolArguments(String),
    /// A piece of model reasoning.
    Thinking(String),
    /// A piece of the signature sealing a reasoning block.
    Signature(String),
    /// Any delta kind the decoder does not interpret.
    Other { kind: String },
}

/// A single event of one model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    BlockStart { index: usize, block: BlockStart },
    BlockDelta { index: usize, delta: BlockDelta },
    BlockStop { index: usize },
    MessageStop,
    /// Everything else (pings, usage updates, future event kinds).
    Other { kind: String },
}

/// Receiving half of a provider stream.
pub type EventReceiver =
    tokio::sync::mpsc::Receiver<std::result::Result<StreamEvent, ProviderError>>;

/// The core Provider trait.
///
/// The conversation loop calls `stream()` without knowing which endpoint
/// serves it. A failed call or an `Err` item on the channel is a hard failure
/// for the current user request.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get the turn's events as they arrive.
    async fn stream(&self, request: ProviderRequest) -> Result<EventReceiver, ProviderError>;
}
