//! Domain event system — observe a request while the loop runs.
//!
//! The conversation loop publishes events as it moves between model calls
//! and tool dispatch. Front-ends subscribe to show progress; nothing in the
//! loop depends on anyone listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A user prompt was accepted into a session
    UserPromptAccepted {
        session_id: String,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// One model turn was fully decoded
    TurnDecoded {
        session_id: String,
        turn: u32,
        tool_requests: usize,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        session_id: String,
        tool_name: String,
        request_id: String,
        output_chars: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The loop converged on a final answer
    AnswerProduced {
        session_id: String,
        turns: u32,
        tools_used: usize,
        timestamp: DateTime<Utc>,
    },

    /// The request failed and its prompt was rolled back
    RequestFailed {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
