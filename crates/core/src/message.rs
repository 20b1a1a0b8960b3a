//! Conversation domain types.
//!
//! A user request moves through these values:
//! user text → model turns ([`AssistantMessage`]) → tool requests
//! ([`ToolInvocationRequest`]) → tool output ([`ToolResult`]) → next turn.
//! Everything is recorded as [`ConversationEntry`] values in an append-only log.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire role of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One content block of an assistant message, as the model produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
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
        #[serde(default)]
        signature: String,
    },
    /// A block kind this crate does not interpret, kept as received.
    Opaque { block: serde_json::Value },
}

/// The structured message a model returned for one turn.
///
/// This is replayed verbatim into the next request so the model's tool-call
/// bookkeeping stays consistent; it is never rebuilt from the decoded text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Content blocks in the order the model opened them.
    pub content: Vec<ContentBlock>,
}

impl AssistantMessage {
    /// A message consisting of a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Visible text: non-empty text blocks joined by newlines.
    pub fn display_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether this message asks for any tool.
    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}

/// A model-issued instruction to run one registered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationRequest {
    /// Correlates this request with its [`ToolResult`].
    pub request_id: String,

    /// Registry identifier of the tool.
    pub tool_id: String,

    /// Parsed arguments; empty when the streamed JSON did not parse.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// The output of executing one [`ToolInvocationRequest`].
///
/// Error text is a valid result: content is always a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub request_id: String,
    pub content: String,
}

impl ToolResult {
    pub fn new(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            content: content.into(),
        }
    }
}

/// One entry of the full interaction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationEntry {
    /// A prompt typed by the user.
    UserText { text: String },

    /// A model turn, replayed verbatim on the next call.
    ///
    /// `tools_used` is display metadata: for a terminal turn it lists every
    /// tool id invoked while producing it, in invocation order. It is never
    /// sent to the model.
    AssistantTurn {
        message: AssistantMessage,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tools_used: Vec<String>,
    },

    /// All tool results for one turn, grouped as a single response unit.
    ToolResultBatch { results: Vec<ToolResult> },
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::UserText { text: text.into() }
    }

    /// An intermediate model turn (no display metadata).
    pub fn assistant(message: AssistantMessage) -> Self {
        Self::AssistantTurn {
            message,
            tools_used: Vec::new(),
        }
    }

    /// The wire role this entry is sent under.
    pub fn role(&self) -> Role {
        match self {
            Self::UserText { .. } | Self::ToolResultBatch { .. } => Role::User,
            Self::AssistantTurn { .. } => Role::Assistant,
        }
    }

    /// A terminal turn is an assistant turn that requested no tools.
    pub fn is_terminal_turn(&self) -> bool {
        matches!(self, Self::AssistantTurn { message, .. } if !message.has_tool_use())
    }
}
