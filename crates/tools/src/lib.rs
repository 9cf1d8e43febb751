//! Built-in tool implementations for deskmind.
//!
//! Tools give the agent the ability to interact with the user's machine
//! and the web: read, write and list files, and fetch URLs.
//! File access goes through a [`PathGuard`].

pub mod fetch;
pub mod list_directory;
pub mod path_guard;
pub mod read_file;
pub mod write_file;

use deskmind_config::ToolsConfig;
use deskmind_core::error::ToolError;
use deskmind_core::tool::ToolRegistry;
use serde_json::Value;
use std::time::Duration;

pub use fetch::FetchTool;
pub use list_directory::ListDirectoryTool;
pub use path_guard::{PathGuard, PathValidationError};
pub use read_file::ReadFileTool;
pub use write_file::WriteFileTool;

/// Create a tool registry with all built-in tools, configured from `config`.
pub fn registry_from_config(config: &ToolsConfig) -> Result<ToolRegistry, ToolError> {
    let guard = PathGuard::new(config.allowed_roots.clone(), config.forbidden_paths.clone());

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ReadFileTool::with_guard(guard.clone())));
    registry.register(Box::new(WriteFileTool::with_guard(guard.clone())));
    registry.register(Box::new(ListDirectoryTool::with_guard(guard)));
    registry.register(Box::new(FetchTool::new(Duration::from_secs(
        config.fetch_timeout_secs,
    ))?));
    Ok(registry)
}

/// Create a registry with the default tool settings.
///
/// Sensitive paths (~/.ssh, /etc, ...) are blocked.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    registry_from_config(&ToolsConfig::default())
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}
