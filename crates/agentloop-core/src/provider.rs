//! LLM Provider Strategy Pattern
//!
//! Defines the request/response contract every model backend fulfils
//! (vendor API, local model, mock), allowing the agent to work with any
//! backend and to swap one for another at runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agentloop_core::provider::{CompletionRequest, LlmProvider};
//!
//! let request = CompletionRequest::new(system_prompt, session.messages().to_vec());
//! let completion = provider.complete(&request).await?;
//! ```

use std::ops::AddAssign;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDefinition};

/// Everything a backend needs to decide the next step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt, sent separately from the history
    pub system_prompt: String,

    /// Full conversation history, in order
    pub messages: Vec<Message>,

    /// Capability list the model may call
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            tools: Vec::new(),
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    #[serde(default)]
    pub content: String,

    /// Tool invocations requested by the model, in order
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Token usage statistics
    #[serde(default)]
    pub usage: TokenUsage,
}

impl Completion {
    /// A plain text answer with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// A response that requests tool calls
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub const fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens = self.input_tokens.saturating_add(rhs.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(rhs.output_tokens);
        self.total_tokens = self.total_tokens.saturating_add(rhs.total_tokens);
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name used in logs (e.g. "anthropic", "ollama")
    fn name(&self) -> &str;

    /// Generate the next assistant turn for the given request
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_accumulates() {
        let mut usage = TokenUsage::new(10, 5);
        assert_eq!(usage.total_tokens, 15);
        usage += TokenUsage::new(3, 2);
        assert_eq!(usage, TokenUsage { input_tokens: 13, output_tokens: 7, total_tokens: 20 });
    }

    #[test]
    fn test_completion_constructors() {
        assert!(!Completion::text("hi").has_tool_calls());
        let call = ToolCall::new("1", "echo", std::collections::HashMap::new());
        assert!(Completion::with_tool_calls("", vec![call]).has_tool_calls());
    }
}
