//! Tool traits: the abstraction over agent capabilities.
//!
//! Tools give the agent the ability to act in the world: read and write
//! files, list directories, fetch web pages. The agent loop never talks to
//! a tool directly; it goes through a [`ToolProvider`], which can be an
//! in-process [`ToolRegistry`] or any other source of tools.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ToolError;

/// Description of a tool as advertised by a tool provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema of the arguments object
    #[serde(
        default,
        rename = "inputSchema",
        alias = "parameter_schema",
        skip_serializing_if = "Option::is_none"
    )]
    pub parameter_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameter_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameter_schema = Some(schema);
        self
    }
}

/// What a tool execution produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(Value),
    Error(String),
}

/// The result of executing one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, value: Value) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: ToolOutcome::Success(value),
        }
    }

    pub fn error(call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            outcome: ToolOutcome::Error(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success(_))
    }

    /// Serialize into the content of a `tool` message.
    ///
    /// `{"tool_call_id": ..., "result": ...}` on success,
    /// `{"tool_call_id": ..., "error": ...}` on failure.
    pub fn to_content(&self) -> String {
        let body = match &self.outcome {
            ToolOutcome::Success(value) => serde_json::json!({
                "tool_call_id": self.call_id,
                "result": value,
            }),
            ToolOutcome::Error(message) => serde_json::json!({
                "tool_call_id": self.call_id,
                "error": message,
            }),
        };
        body.to_string()
    }
}

/// A single executable tool.
///
/// Each tool (read_file, write_file, list_directory, fetch) implements this
/// trait and is registered in a [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file", "fetch").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with an already-parsed arguments object.
    async fn execute(&self, arguments: Value) -> std::result::Result<Value, ToolError>;

    fn to_descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name())
            .with_description(self.description())
            .with_schema(self.parameters_schema())
    }
}

/// An external source of tools: something that can list and call them.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Currently available tools.
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError>;

    /// Invoke a tool by name with a JSON object of arguments.
    async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<Value, ToolError>;
}

/// An in-process registry of tools.
///
/// Tools are kept sorted by name, so listing order is deterministic.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.to_descriptor()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, ToolError> {
        Ok(self.descriptors())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> std::result::Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(arguments).await
    }
}
