//! `read_file`: read a UTF-8 file with path validation.

use async_trait::async_trait;
use deskmind_core::error::ToolError;
use deskmind_core::tool::Tool;
use serde_json::Value;

use crate::path_guard::PathGuard;
use crate::required_str;

pub struct ReadFileTool {
    guard: PathGuard,
}

impl ReadFileTool {
    /// Create a read tool with no path restrictions.
    pub fn new() -> Self {
        Self::with_guard(PathGuard::unrestricted())
    }

    pub fn with_guard(guard: PathGuard) -> Self {
        Self { guard }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the complete contents of a text file at the given path."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let path = required_str(&arguments, "path")?;

        let resolved = self.guard.check(path).map_err(|e| ToolError::PermissionDenied {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })?;

        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: format!("Failed to read {path}: {e}"),
            })?;

        Ok(Value::String(content))
    }
}
