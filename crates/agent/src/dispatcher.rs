//! Tool dispatch: turns model tool calls into tool results.

use deskmind_config::ToolFailurePolicy;
use deskmind_core::error::ToolError;
use deskmind_core::message::ToolCallRequest;
use deskmind_core::tool::{ToolDescriptor, ToolProvider, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes tool calls against a [`ToolProvider`].
pub struct ToolDispatcher {
    tools: Arc<dyn ToolProvider>,
    policy: ToolFailurePolicy,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<dyn ToolProvider>) -> Self {
        Self {
            tools,
            policy: ToolFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ToolFailurePolicy {
        self.policy
    }

    /// Current tool listing, sorted by name.
    pub async fn list(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let mut tools = self.tools.list_tools().await?;
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tools)
    }

    /// Execute one call.
    ///
    /// Argument errors always become error results. Other failures become
    /// error results under [`ToolFailurePolicy::Recover`] and are returned
    /// as `Err` under [`ToolFailurePolicy::Abort`].
    pub async fn execute(&self, call: &ToolCallRequest) -> Result<ToolResult, ToolError> {
        let arguments = match parse_arguments(&call.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Rejected tool arguments");
                return Ok(ToolResult::error(&call.id, e.to_string()));
            }
        };

        debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");
        match self.tools.call_tool(&call.name, arguments).await {
            Ok(value) => Ok(ToolResult::success(&call.id, value)),
            Err(e) if e.is_argument_error() => Ok(ToolResult::error(&call.id, e.to_string())),
            Err(e) => match self.policy {
                ToolFailurePolicy::Recover => {
                    warn!(tool = %call.name, error = %e, "Tool failed, reporting to model");
                    Ok(ToolResult::error(&call.id, e.to_string()))
                }
                ToolFailurePolicy::Abort => Err(e),
            },
        }
    }
}

/// Parse a JSON-encoded arguments string into an object.
///
/// An empty (or blank) string is treated as `{}`.
pub fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(ToolError::InvalidArguments(
            "arguments must be a JSON object".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{EchoTools, make_tool_call};
    use deskmind_core::tool::ToolOutcome;
    use serde_json::json;

    #[test]
    fn empty_arguments_are_an_empty_object() {
        assert_eq!(parse_arguments("").unwrap(), json!({}));
        assert_eq!(parse_arguments("  ").unwrap(), json!({}));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        assert!(parse_arguments("[1, 2]").unwrap_err().is_argument_error());
        assert!(parse_arguments("\"path\"").unwrap_err().is_argument_error());
        assert!(parse_arguments("{not json").unwrap_err().is_argument_error());
    }

    #[tokio::test]
    async fn successful_call_wraps_value() {
        let dispatcher = ToolDispatcher::new(Arc::new(EchoTools::new()));
        let call = make_tool_call("echo", json!({"text": "hi"}));

        let result = dispatcher.execute(&call).await.unwrap();
        assert_eq!(result.call_id, call.id);
        assert_eq!(result.outcome, ToolOutcome::Success(json!({"text": "hi"})));
    }

    #[tokio::test]
    async fn bad_arguments_are_recorded_even_when_aborting() {
        let tools = Arc::new(EchoTools::new());
        let dispatcher = ToolDispatcher::new(tools.clone()).with_policy(ToolFailurePolicy::Abort);
        let call = ToolCallRequest::new("call_1", "echo", "not json");

        let result = dispatcher.execute(&call).await.unwrap();
        assert!(!result.is_success());
        assert_eq!(tools.call_count(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_follows_policy() {
        let call = make_tool_call("missing", json!({}));

        let recover = ToolDispatcher::new(Arc::new(EchoTools::new()));
        let result = recover.execute(&call).await.unwrap();
        assert!(matches!(result.outcome, ToolOutcome::Error(ref m) if m.contains("missing")));

        let abort =
            ToolDispatcher::new(Arc::new(EchoTools::new())).with_policy(ToolFailurePolicy::Abort);
        let err = abort.execute(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_is_sorted() {
        let dispatcher = ToolDispatcher::new(Arc::new(EchoTools::new()));
        let names: Vec<_> = dispatcher
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["echo", "fail"]);
    }
}
