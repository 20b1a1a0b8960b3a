//! The conversation loop implementation.

use crate::decoder::decode_stream;
use crate::history::ConversationState;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use chrono::Utc;
use docent_config::AppConfig;
use docent_core::error::Error;
use docent_core::event::{DomainEvent, EventBus};
use docent_core::message::{ConversationEntry, ToolResult};
use docent_core::provider::{Provider, ProviderRequest};
use docent_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The outcome of one user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Visible text of the terminal turn, as the session history shows it.
    pub text: String,
    /// Every tool id invoked for this request, in invocation order.
    pub tools_used: Vec<String>,
    /// Model calls made.
    pub turns: u32,
}

/// Drives model turns and tool dispatch until the model stops asking for tools.
pub struct ConversationLoop {
    /// The model endpoint
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Tool registry offered on every call
    tools: Arc<ToolRegistry>,

    /// System prompt sent on every call
    system_prompt: String,

    /// Max tokens per model response
    max_tokens: u32,

    /// Temperature; endpoint default when unset
    temperature: Option<f32>,

    /// Model calls allowed per user request
    max_turns: u32,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl ConversationLoop {
    /// Create a new loop with default limits.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            tools,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_tokens: 8192,
            temperature: None,
            max_turns: 25,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Create a loop with every setting taken from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let mut runner = Self::new(provider, &config.model, tools)
            .with_max_tokens(config.max_output_tokens)
            .with_max_turns(config.max_turns);
        if let Some(prompt) = &config.system_prompt {
            runner = runner.with_system_prompt(prompt);
        }
        if let Some(t) = config.temperature {
            runner = runner.with_temperature(t);
        }
        runner
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of model calls per user request.
    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    /// Publish domain events on a shared bus.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = bus;
        self
    }

    /// Answer one user prompt.
    ///
    /// On success the prompt and the terminal turn are merged into `state`.
    /// On any failure `state` is left exactly as it was, so the prompt can
    /// be retried without duplicated context.
    pub async fn respond(
        &self,
        state: &mut ConversationState,
        prompt: &str,
    ) -> Result<Answer, Error> {
        let session_id = state.id.to_string();
        info!(
            session_id = %session_id,
            history = state.len(),
            "Processing user prompt"
        );

        self.event_bus.publish(DomainEvent::UserPromptAccepted {
            session_id: session_id.clone(),
            content_preview: prompt.chars().take(80).collect(),
            timestamp: Utc::now(),
        });

        let user_entry = ConversationEntry::user(prompt);
        let mut log = state.entries().to_vec();
        log.push(user_entry.clone());

        match self.run(&session_id, log).await {
            Ok((answer, terminal)) => {
                state.commit(user_entry, terminal);
                self.event_bus.publish(DomainEvent::AnswerProduced {
                    session_id,
                    turns: answer.turns,
                    tools_used: answer.tools_used.len(),
                    timestamp: Utc::now(),
                });
                Ok(answer)
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Request failed; prompt rolled back");
                self.event_bus.publish(DomainEvent::RequestFailed {
                    session_id,
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    /// Call the model until a turn requests no tools.
    ///
    /// `log` is the working log for this request; it grows by one assistant
    /// turn and one result batch per tool-requesting turn.
    async fn run(
        &self,
        session_id: &str,
        mut log: Vec<ConversationEntry>,
    ) -> Result<(Answer, ConversationEntry), Error> {
        let descriptors = self.tools.descriptors();
        let mut tools_used: Vec<String> = Vec::new();

        for turn in 1..=self.max_turns {
            debug!(session_id = %session_id, turn, entries = log.len(), "Calling model");

            let request = ProviderRequest {
                model: self.model.clone(),
                system: self.system_prompt.clone(),
                messages: log.clone(),
                tools: descriptors.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            let events = self.provider.stream(request).await?;
            let decoded = decode_stream(events).await?;

            self.event_bus.publish(DomainEvent::TurnDecoded {
                session_id: session_id.to_string(),
                turn,
                tool_requests: decoded.tool_requests.len(),
                timestamp: Utc::now(),
            });

            if decoded.is_terminal() {
                info!(
                    session_id = %session_id,
                    turns = turn,
                    tool_count = tools_used.len(),
                    "Answer produced"
                );
                let answer = Answer {
                    text: decoded.raw_message.display_text(),
                    tools_used,
                    turns: turn,
                };
                let terminal = ConversationEntry::AssistantTurn {
                    message: decoded.raw_message,
                    tools_used: answer.tools_used.clone(),
                };
                return Ok((answer, terminal));
            }

            debug!(
                session_id = %session_id,
                turn,
                tool_count = decoded.tool_requests.len(),
                "Executing tool requests"
            );

            // The turn goes in before its results so the next call sees the
            // tool_use blocks the results answer.
            log.push(ConversationEntry::assistant(decoded.raw_message));

            let mut results: Vec<ToolResult> = Vec::with_capacity(decoded.tool_requests.len());
            for request in &decoded.tool_requests {
                let start = std::time::Instant::now();
                let result = self.tools.dispatch(request).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                self.event_bus.publish(DomainEvent::ToolExecuted {
                    session_id: session_id.to_string(),
                    tool_name: request.tool_id.clone(),
                    request_id: request.request_id.clone(),
                    output_chars: result.content.chars().count(),
                    duration_ms,
                    timestamp: Utc::now(),
                });

                tools_used.push(request.tool_id.clone());
                results.push(result);
            }

            log.push(ConversationEntry::ToolResultBatch { results });
        }

        warn!(
            session_id = %session_id,
            max_turns = self.max_turns,
            "Tool loop did not converge"
        );
        Err(Error::NotConverged {
            turns: self.max_turns,
        })
    }
}
