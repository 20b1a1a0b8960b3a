//! Tool trait and registry — the retrieval capabilities offered to the model.
//!
//! Every tool is a side-effect-free reader bound to one resource. The
//! registry is fixed at startup; the model selects tools from it by name.

use crate::error::Error;
use crate::message::{ToolInvocationRequest, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Tool arguments as parsed from the model's request.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// The invocation contract sent to the model for one tool.
///
/// Serializes to the Messages API shape `{name, description, input_schema}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool identifier
    pub name: String,

    /// Natural-language description the model uses to pick the tool
    pub description: String,

    /// JSON Schema of the arguments
    pub input_schema: serde_json::Value,
}

/// Schema for a tool that takes no arguments.
pub fn empty_object_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// A retrieval capability.
///
/// `execute` never fails: a missing document or a read error is reported as
/// descriptive text, which the model receives like any other tool output.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique identifier of this tool (e.g. "read_sbatch_doc").
    fn name(&self) -> &str;

    /// A description of what this tool returns (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value {
        empty_object_schema()
    }

    /// Run the tool and return its content.
    async fn execute(&self, arguments: &ToolArguments) -> String;

    /// Convert this tool into the descriptor sent to the LLM.
    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// The fixed set of tools available to the conversation loop.
///
/// Registration order is kept so the descriptor list sent to the model is
/// stable from one call to the next.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Identifiers must be unique.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), Error> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All descriptors, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.to_descriptor()).collect()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by identifier.
    ///
    /// Identifiers outside the registry never reach a tool: they yield
    /// `"Unknown tool: <id>"` instead.
    pub async fn execute(&self, tool_id: &str, arguments: &ToolArguments) -> String {
        match self.get(tool_id) {
            Some(tool) => tool.execute(arguments).await,
            None => {
                warn!(tool = %tool_id, "Model requested a tool outside the registry");
                format!("Unknown tool: {tool_id}")
            }
        }
    }

    /// Execute one invocation request and wrap its output.
    pub async fn dispatch(&self, request: &ToolInvocationRequest) -> ToolResult {
        debug!(tool = %request.tool_id, request_id = %request.request_id, "Dispatching tool");
        let content = self.execute(&request.tool_id, &request.arguments).await;
        ToolResult::new(request.request_id.clone(), content)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
