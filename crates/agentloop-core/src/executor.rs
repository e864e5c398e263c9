//! Tool Executor
//!
//! Runs the tool calls a model asks for. Failures of individual tools are
//! data for the model, not faults of the loop: only a batch in which every
//! call failed is reported as an error, and even then every result is kept.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::{ToolArguments, ToolCall, ToolRegistry, ToolResult};

/// Executes tool calls against a registry
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub const fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Run a single tool by name.
    ///
    /// The executor enforces no timeout; `cancel` is handed to the tool,
    /// which decides whether to honour it.
    pub async fn execute(
        &self,
        cancel: &CancellationToken,
        name: &str,
        arguments: &ToolArguments,
    ) -> Result<Value> {
        let tool = self.registry.get(name)?;
        tool.validate(arguments)?;

        tool.execute(cancel, arguments)
            .await
            .map_err(|e| AgentError::ToolExecutionFailed {
                tool: name.to_string(),
                source: e.into(),
            })
    }

    /// Run every call in order, one after another.
    ///
    /// Yields one result per call, in call order. Returns
    /// [`AgentError::AllToolsFailed`] (carrying the results) only when the
    /// batch is non-empty and no call succeeded.
    pub async fn execute_batch(
        &self,
        cancel: &CancellationToken,
        calls: &[ToolCall],
    ) -> Result<Vec<ToolResult>> {
        let mut results = Vec::with_capacity(calls.len());
        let mut failures = 0usize;

        for call in calls {
            debug!(tool = %call.name, call_id = %call.id, "executing tool call");

            match self.execute(cancel, &call.name, &call.arguments).await {
                Ok(value) => results.push(ToolResult::success(&call.id, &call.name, value)),
                Err(e) => {
                    warn!(tool = %call.name, call_id = %call.id, error = %e, "tool call failed");
                    failures += 1;
                    results.push(ToolResult::failure(&call.id, &call.name, e));
                }
            }
        }

        if !calls.is_empty() && failures == calls.len() {
            return Err(AgentError::AllToolsFailed { results });
        }

        Ok(results)
    }

    /// Turn results into tool-result messages for the next backend request
    pub fn results_to_messages(results: &[ToolResult]) -> Vec<Message> {
        results
            .iter()
            .map(|result| match &result.outcome {
                Ok(value) => match serde_json::to_string(value) {
                    Ok(content) => Message::tool_result(&result.id, &result.name, content, false),
                    Err(e) => Message::tool_result(
                        &result.id,
                        &result.name,
                        format!("tool failed: {e}"),
                        true,
                    ),
                },
                Err(e) => {
                    Message::tool_result(&result.id, &result.name, format!("tool failed: {e}"), true)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::tool::{ParameterSchema, Tool, ToolDefinition};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolDefinition {
            ToolDefinition::new(
                "echo",
                "Echoes the message",
                vec![ParameterSchema::new("message", "string", "Text to echo").required()],
            )
        }

        async fn execute(
            &self,
            _cancel: &CancellationToken,
            arguments: &ToolArguments,
        ) -> anyhow::Result<Value> {
            Ok(json!({ "message": arguments["message"] }))
        }
    }

    struct FailTool;

    #[async_trait]
    impl Tool for FailTool {
        fn schema(&self) -> ToolDefinition {
            ToolDefinition::new("fail", "Always fails", Vec::new())
        }

        async fn execute(
            &self,
            _cancel: &CancellationToken,
            _arguments: &ToolArguments,
        ) -> anyhow::Result<Value> {
            anyhow::bail!("intentional failure")
        }
    }

    /// Records the order in which it ran
    struct OrderTool {
        counter: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for OrderTool {
        fn schema(&self) -> ToolDefinition {
            ToolDefinition::new("order", "Returns its position", Vec::new())
        }

        async fn execute(
            &self,
            _cancel: &CancellationToken,
            _arguments: &ToolArguments,
        ) -> anyhow::Result<Value> {
            Ok(json!(self.counter.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(FailTool);
        ToolExecutor::new(Arc::new(registry))
    }

    fn echo_call(id: &str, text: &str) -> ToolCall {
        let mut args = ToolArguments::new();
        args.insert("message".into(), json!(text));
        ToolCall::new(id, "echo", args)
    }

    #[tokio::test]
    async fn test_execute_success() {
        let cancel = CancellationToken::new();
        let call = echo_call("1", "hello");
        let value = executor().execute(&cancel, "echo", &call.arguments).await.unwrap();
        assert_eq!(value, json!({"message": "hello"}));
    }

    #[tokio::test]
    async fn test_execute_not_found() {
        let cancel = CancellationToken::new();
        let err = executor().execute(&cancel, "missing", &ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_execute_wraps_tool_error() {
        let cancel = CancellationToken::new();
        let err = executor().execute(&cancel, "fail", &ToolArguments::new()).await.unwrap_err();
        match err {
            AgentError::ToolExecutionFailed { tool, source } => {
                assert_eq!(tool, "fail");
                assert!(source.to_string().contains("intentional failure"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_execute_validates_arguments() {
        let cancel = CancellationToken::new();
        let err = executor().execute(&cancel, "echo", &ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let cancel = CancellationToken::new();
        let results = executor().execute_batch(&cancel, &[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_all_failed_batch() {
        let cancel = CancellationToken::new();
        let calls = vec![
            ToolCall::new("a", "fail", ToolArguments::new()),
            ToolCall::new("b", "missing", ToolArguments::new()),
            ToolCall::new("c", "fail", ToolArguments::new()),
        ];

        let err = executor().execute_batch(&cancel, &calls).await.unwrap_err();
        let AgentError::AllToolsFailed { results } = err else {
            panic!("expected AllToolsFailed");
        };
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(ToolResult::is_error));
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_partial_failure_is_not_an_error() {
        let cancel = CancellationToken::new();
        let calls = vec![
            ToolCall::new("a", "fail", ToolArguments::new()),
            echo_call("b", "still here"),
        ];

        let results = executor().execute_batch(&cancel, &calls).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_error());
        assert_eq!(results[1].value(), Some(&json!({"message": "still here"})));
    }

    #[tokio::test]
    async fn test_batch_runs_in_call_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(OrderTool { counter: counter.clone() });
        let executor = ToolExecutor::new(Arc::new(registry));

        let calls: Vec<ToolCall> = (0..4)
            .map(|i| ToolCall::new(format!("call_{i}"), "order", ToolArguments::new()))
            .collect();
        let results = executor.execute_batch(&CancellationToken::new(), &calls).await.unwrap();

        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.id, format!("call_{i}"));
            assert_eq!(result.value(), Some(&json!(i)));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_results_to_messages() {
        let results = vec![
            ToolResult::success("a", "echo", json!({"message": "hi"})),
            ToolResult::failure("b", "fail", AgentError::ToolNotFound("fail".into())),
        ];

        let messages = ToolExecutor::results_to_messages(&results);
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, r#"{"message":"hi"}"#);
        assert_eq!(messages[0].tool_result_id.as_deref(), Some("a"));
        assert!(!messages[0].is_error);

        assert!(messages[1].content.starts_with("tool failed: "));
        assert!(messages[1].content.contains("fail"));
        assert_eq!(messages[1].tool_name.as_deref(), Some("fail"));
        assert!(messages[1].is_error);
    }
}
