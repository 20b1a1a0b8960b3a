//! Stream decoder: folds one model turn's events into a [`DecodedTurn`].
//!
//! Decoding never fails on content. Unknown events are skipped, blocks of
//! unknown kind are kept as received for replay, malformed
//! tool arguments become an empty mapping, and a tool block that never
//! stops is dropped. The only error is one reported by the provider itself.

use docent_core::error::ProviderError;
use docent_core::message::{AssistantMessage, ContentBlock, ToolInvocationRequest};
use docent_core::provider::{BlockDelta, BlockStart, EventReceiver, StreamEvent};
use std::collections::HashMap;
use tracing::trace;

/// Everything one model turn produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedTurn {
    /// All text deltas in arrival order.
    pub text: String,
    /// Completed tool invocations, in the order their blocks were opened.
    pub tool_requests: Vec<ToolInvocationRequest>,
    /// The structured message to replay into the next request.
    pub raw_message: AssistantMessage,
}

impl DecodedTurn {
    pub fn is_terminal(&self) -> bool {
        self.tool_requests.is_empty()
    }
}

/// Whether the decoder wants more events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
}

#[derive(Debug)]
enum Slot {
    Text(String),
    Tool {
        id: String,
        name: String,
        arguments: String,
        parsed: Option<serde_json::Map<String, serde_json::Value>>,
    },
    Thinking {
        thinking: String,
        signature: String,
    },
    Opaque(serde_json::Value),
}

/// Incremental decoder state for one turn.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    text: String,
    /// Blocks in the order they were opened
    slots: Vec<Slot>,
    /// Stream block index → position in `slots`
    by_index: HashMap<usize, usize>,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. After `Step::Done` further events are ignored.
    pub fn feed(&mut self, event: StreamEvent) -> Step {
        if self.done {
            return Step::Done;
        }

        match event {
            StreamEvent::BlockStart { index, block } => match block {
                BlockStart::Text { text } => {
                    self.text.push_str(&text);
                    self.open(index, Slot::Text(text));
                }
                BlockStart::ToolUse { id, name } => {
                    self.open(
                        index,
                        Slot::Tool {
                            id,
                            name,
                            arguments: String::new(),
                            parsed: None,
                        },
                    );
                }
                BlockStart::Thinking {
                    thinking,
                    signature,
                } => {
                    self.open(
                        index,
                        Slot::Thinking {
                            thinking,
                            signature,
                        },
                    );
                }
                BlockStart::Other { kind, block } => {
                    trace!(index, kind = %kind, "Keeping opaque block");
                    self.open(index, Slot::Opaque(block));
                }
            },
            StreamEvent::BlockDelta { index, delta } => match delta {
                BlockDelta::Text(piece) => {
                    self.text.push_str(&piece);
                    match self.slot_mut(index) {
                        Some(Slot::Text(text)) => text.push_str(&piece),
                        Some(_) => {}
                        None => self.open(index, Slot::Text(piece)),
                    }
                }
                BlockDelta::ToolArguments(fragment) => {
                    if let Some(Slot::Tool {
                        arguments,
                        parsed: None,
                        ..
                    }) = self.slot_mut(index)
                    {
                        arguments.push_str(&fragment);
                    }
                }
                BlockDelta::Thinking(piece) => match self.slot_mut(index) {
                    Some(Slot::Thinking { thinking, .. }) => thinking.push_str(&piece),
                    Some(_) => {}
                    None => self.open(
                        index,
                        Slot::Thinking {
                            thinking: piece,
                            signature: String::new(),
                        },
                    ),
                },
                BlockDelta::Signature(piece) => {
                    if let Some(Slot::Thinking { signature, .. }) = self.slot_mut(index) {
                        signature.push_str(&piece);
                    }
                }
                BlockDelta::Other { kind } => {
                    trace!(index, kind = %kind, "Skipping delta");
                }
            },
            StreamEvent::BlockStop { index } => {
                if let Some(Slot::Tool {
                    name,
                    arguments,
                    parsed,
                    ..
                }) = self.slot_mut(index)
                    && parsed.is_none()
                {
                    *parsed = Some(parse_arguments(name, arguments));
                }
            }
            StreamEvent::MessageStop => {
                self.done = true;
                return Step::Done;
            }
            StreamEvent::Other { kind } => {
                trace!(kind = %kind, "Skipping event");
            }
        }

        Step::Continue
    }

    /// Produce the turn from everything fed so far.
    pub fn finish(self) -> DecodedTurn {
        let mut tool_requests = Vec::new();
        let mut content = Vec::with_capacity(self.slots.len());

        for slot in self.slots {
            match slot {
                // The endpoint rejects empty text blocks on replay
                Slot::Text(text) if text.is_empty() => {}
                Slot::Text(text) => content.push(ContentBlock::Text { text }),
                Slot::Tool {
                    id,
                    name,
                    parsed: Some(arguments),
                    ..
                } => {
                    content.push(ContentBlock::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: serde_json::Value::Object(arguments.clone()),
                    });
                    tool_requests.push(ToolInvocationRequest {
                        request_id: id,
                        tool_id: name,
                        arguments,
                    });
                }
                Slot::Tool {
                    id, parsed: None, ..
                } => {
                    trace!(request_id = %id, "Dropping tool block that never stopped");
                }
                Slot::Thinking {
                    thinking,
                    signature,
                } => content.push(ContentBlock::Thinking {
                    thinking,
                    signature,
                }),
                Slot::Opaque(block) => content.push(ContentBlock::Opaque { block }),
            }
        }

        DecodedTurn {
            text: self.text,
            tool_requests,
            raw_message: AssistantMessage { content },
        }
    }

    fn open(&mut self, index: usize, slot: Slot) {
        self.by_index.insert(index, self.slots.len());
        self.slots.push(slot);
    }

    fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        let pos = *self.by_index.get(&index)?;
        self.slots.get_mut(pos)
    }
}

/// Empty or malformed argument text yields an empty mapping.
fn parse_arguments(tool: &str, text: &str) -> serde_json::Map<String, serde_json::Value> {
    if text.trim().is_empty() {
        return serde_json::Map::new();
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => {
            trace!(tool = %tool, kind = ?other, "Tool arguments are not an object");
            serde_json::Map::new()
        }
        Err(e) => {
            trace!(tool = %tool, error = %e, "Malformed tool arguments");
            serde_json::Map::new()
        }
    }
}

/// Decode a finite event sequence.
pub fn decode(events: impl IntoIterator<Item = StreamEvent>) -> DecodedTurn {
    let mut decoder = StreamDecoder::new();
    for event in events {
        if decoder.feed(event) == Step::Done {
            break;
        }
    }
    decoder.finish()
}

/// Decode a provider stream as events arrive.
///
/// A closed channel without `MessageStop` ends the turn with what was
/// received. An `Err` item aborts it.
pub async fn decode_stream(mut rx: EventReceiver) -> Result<DecodedTurn, ProviderError> {
    let mut decoder = StreamDecoder::new();
    while let Some(item) = rx.recv().await {
        if decoder.feed(item?) == Step::Done {
            break;
        }
    }
    Ok(decoder.finish())
}
