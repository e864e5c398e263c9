//! Error Types

use thiserror::Error;

use crate::tool::ToolResult;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model backend call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Required tool arguments missing or malformed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// The tool ran and reported an error of its own
    #[error("Tool '{tool}' execution failed: {source}")]
    ToolExecutionFailed {
        tool: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Every call in a non-empty batch failed. Carries all per-call results.
    #[error("All {} tool calls failed", .results.len())]
    AllToolsFailed { results: Vec<ToolResult> },

    /// Maximum iterations reached in the agent loop
    #[error("max iterations ({0}) reached without a final answer")]
    MaxIterations(usize),

    /// Caller cancelled the run
    #[error("Run cancelled")]
    Cancelled,

    /// Model switching requested but no backend factory was supplied
    #[error("Model switching not configured")]
    SwapNotConfigured,

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Whether the loop feeds this error back to the model instead of aborting.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_)
                | Self::ToolValidation(_)
                | Self::ToolExecutionFailed { .. }
                | Self::AllToolsFailed { .. }
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecutionFailed { tool, .. } => format!("The tool '{tool}' failed."),
            Self::AllToolsFailed { .. } => "None of the requested tools could run.".into(),
            Self::MaxIterations(_) => {
                "The request took too long to process. Please try a simpler query.".into()
            }
            Self::Cancelled => "The request was cancelled.".into(),
            Self::SwapNotConfigured => "Switching models is not available here.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
