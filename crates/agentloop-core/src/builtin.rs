//! Built-in Tools

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::tool::{ParameterSchema, Tool, ToolArguments, ToolDefinition};

/// Echo tool - returns the message it was given
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn schema(&self) -> ToolDefinition {
        ToolDefinition::new(
            "echo",
            "Echo a message back unchanged",
            vec![ParameterSchema::new("message", "string", "The message to echo").required()],
        )
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        arguments: &ToolArguments,
    ) -> anyhow::Result<Value> {
        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("'message' must be a string"))?;

        Ok(json!({ "message": message }))
    }
}

/// DateTime tool - returns current time
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn schema(&self) -> ToolDefinition {
        ToolDefinition::new(
            "datetime",
            "Get the current date and time (UTC)",
            vec![
                ParameterSchema::new("format", "string", "Output format: 'iso', 'human', or 'unix'")
                    .one_of(vec![json!("iso"), json!("human"), json!("unix")]),
            ],
        )
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
        arguments: &ToolArguments,
    ) -> anyhow::Result<Value> {
        let format = arguments
            .get("format")
            .and_then(Value::as_str)
            .unwrap_or("human");

        let now = chrono::Utc::now();

        let output = match format {
            "iso" => json!(now.to_rfc3339()),
            "unix" => json!(now.timestamp()),
            "human" => json!(now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string()),
            other => anyhow::bail!("unsupported format '{other}'"),
        };

        Ok(output)
    }
}
