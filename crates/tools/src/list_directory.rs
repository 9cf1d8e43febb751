//! `list_directory`: list the entries of one directory.

use async_trait::async_trait;
use deskmind_core::error::ToolError;
use deskmind_core::tool::Tool;
use serde_json::{Value, json};

use crate::path_guard::PathGuard;
use crate::required_str;

pub struct ListDirectoryTool {
    guard: PathGuard,
}

impl ListDirectoryTool {
    pub fn new() -> Self {
        Self::with_guard(PathGuard::unrestricted())
    }

    pub fn with_guard(guard: PathGuard) -> Self {
        Self { guard }
    }
}

impl Default for ListDirectoryTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ListDirectoryTool {
    fn name(&self) -> &str {
        "list_directory"
    }

    fn description(&self) -> &str {
        "List the files and subdirectories of a directory. Entries are sorted by name."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory to list"
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

        let failed = |e: std::io::Error| ToolError::ExecutionFailed {
            tool_name: "list_directory".into(),
            reason: format!("Failed to list {path}: {e}"),
        };

        let mut reader = tokio::fs::read_dir(&resolved).await.map_err(failed)?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(failed)? {
            let kind = match entry.file_type().await {
                Ok(ft) if ft.is_dir() => "directory",
                Ok(ft) if ft.is_symlink() => "symlink",
                _ => "file",
            };
            entries.push((entry.file_name().to_string_lossy().to_string(), kind));
        }
        entries.sort();

        Ok(Value::Array(
            entries
                .into_iter()
                .map(|(name, kind)| json!({ "name": name, "type": kind }))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_sorted_entries_with_kinds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let result = ListDirectoryTool::new()
            .execute(json!({ "path": dir.path().to_str().unwrap() }))
            .await
            .unwrap();

        assert_eq!(
            result,
            json!([
                {"name": "a.txt", "type": "file"},
                {"name": "b.txt", "type": "file"},
                {"name": "sub", "type": "directory"}
            ])
        );
    }

    #[tokio::test]
    async fn missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ListDirectoryTool::new()
            .execute(json!({ "path": dir.path().join("gone").to_str().unwrap() }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn traversal_is_denied() {
        let err = ListDirectoryTool::new()
            .execute(json!({ "path": "../.." }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PermissionDenied { .. }));
    }
}
