//! The conversation loop — the heart of Docent.
//!
//! A user request runs as a sequence of model turns:
//!
//! 1. **Send** the full log plus the tool registry to the model
//! 2. **Decode** the streamed turn into text, tool requests and the raw message
//! 3. **If tool requests**: append the raw turn, run every tool, append one
//!    result batch, loop back to step 1
//! 4. **If none**: the turn's text is the answer
//!
//! The loop stops at the first turn without tool requests, or fails once the
//! configured turn limit is spent.

pub mod decoder;
pub mod history;
pub mod loop_runner;
pub mod prompt;
pub mod session;

pub use decoder::{DecodedTurn, StreamDecoder, decode, decode_stream};
pub use history::{ConversationState, DisplayEntry, display_log, display_name, referenced_summary};
pub use loop_runner::{Answer, ConversationLoop};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use session::Session;
