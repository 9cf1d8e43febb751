//! `write_file`: create or overwrite a file with path validation.

use async_trait::async_trait;
use deskmind_core::error::ToolError;
use deskmind_core::tool::Tool;
use serde_json::Value;

use crate::path_guard::PathGuard;
use crate::required_str;

pub struct WriteFileTool {
    guard: PathGuard,
}

impl WriteFileTool {
    /// Create a write tool with no path restrictions.
    pub fn new() -> Self {
        Self::with_guard(PathGuard::unrestricted())
    }

    pub fn with_guard(guard: PathGuard) -> Self {
        Self { guard }
    }

    fn failed(&self, reason: String) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason,
        }
    }
}

impl Default for WriteFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file if it doesn't exist, overwrites if it does."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let path = required_str(&arguments, "path")?;
        let content = required_str(&arguments, "content")?;

        let resolved = self.guard.check(path).map_err(|e| ToolError::PermissionDenied {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = resolved.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.failed(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&resolved, content)
            .await
            .map_err(|e| self.failed(format!("Failed to write {path}: {e}")))?;

        Ok(Value::String(format!(
            "Successfully wrote {} bytes to {path}",
            content.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_definition() {
        let tool = WriteFileTool::new();
        assert_eq!(tool.name(), "write_file");
        assert_eq!(
            tool.parameters_schema()["required"],
            serde_json::json!(["path", "content"])
        );
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("out.txt");

        let result = WriteFileTool::new()
            .execute(serde_json::json!({
                "path": target.to_str().unwrap(),
                "content": "hello"
            }))
            .await
            .unwrap();

        assert!(result.as_str().unwrap().contains("5 bytes"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hello");
    }

    #[tokio::test]
    async fn missing_content_argument() {
        let err = WriteFileTool::new()
            .execute(serde_json::json!({ "path": "/tmp/x.txt" }))
            .await
            .unwrap_err();
        assert!(err.is_argument_error());
    }

    #[tokio::test]
    async fn write_outside_allowed_root_denied() {
        let dir = tempfile::tempdir().unwrap();
        let tool = WriteFileTool::with_guard(PathGuard::new(
            vec![dir.path().to_string_lossy().to_string()],
            vec![],
        ));

        let err = tool
            .execute(serde_json::json!({
                "path": "/definitely/not/allowed.txt",
                "content": "x"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PermissionDenied { .. }));
    }
}
