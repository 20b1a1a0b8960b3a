//! # Docent Core
//!
//! Domain types, traits, and error definitions for the Docent documentation
//! assistant. This crate has no framework dependencies: it defines the
//! conversation model, the tool registry and the provider contract that the
//! other crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: conversation entries, assistant messages and tool traffic
//! - [`tool`]: tool descriptors, the `Tool` capability trait and the registry
//! - [`provider`]: the streaming model contract and its typed event stream
//! - [`event`]: domain events broadcast while a request is processed

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{
    AssistantMessage, ContentBlock, ConversationEntry, Role, SessionId, ToolInvocationRequest,
    ToolResult,
};
pub use provider::{
    BlockDelta, BlockStart, EventReceiver, Provider, ProviderRequest, StreamEvent,
};
pub use tool::{Tool, ToolDescriptor, ToolRegistry};
