//! Conversation Messages
//!
//! Standard message format used across the agent system. The ordered list of
//! messages in a session is the whole context window sent to the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input, including tool results handed back to the model
    User,
    /// Assistant (LLM) response
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content (may be empty when only tool calls are present)
    #[serde(default)]
    pub content: String,

    /// Tool invocations requested by the assistant, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Id of the tool call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result_id: Option<String>,

    /// Name of the tool that produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Whether the carried tool result is an error
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result_id: None,
            tool_name: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message that invokes tools
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::assistant(content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a message carrying a tool's result back to the model
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        let mut msg = Self::user(content);
        msg.tool_result_id = Some(tool_call_id.into());
        msg.tool_name = Some(tool_name.into());
        msg.is_error = is_error;
        msg
    }

    /// Whether the assistant requested any tool calls in this message
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Whether this message carries a tool result
    pub const fn is_tool_result(&self) -> bool {
        self.tool_result_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.has_tool_calls());
        assert!(!msg.is_tool_result());
    }

    #[test]
    fn test_tool_result_shape() {
        let msg = Message::tool_result("call_1", "echo", "{\"message\":\"hi\"}", false);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.tool_result_id.as_deref(), Some("call_1"));
        assert_eq!(msg.tool_name.as_deref(), Some("echo"));
        assert!(msg.is_tool_result());
        assert!(!msg.is_error);
    }

    #[test]
    fn test_serialization_skips_absent_tool_fields() {
        let json = serde_json::to_value(Message::assistant("done")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_result_id").is_none());
        assert!(json.get("is_error").is_none());

        let call = ToolCall::new("call_9", "echo", HashMap::new());
        let json = serde_json::to_value(Message::assistant_with_tools("", vec![call])).unwrap();
        assert_eq!(json["tool_calls"][0]["id"], "call_9");
    }
}
