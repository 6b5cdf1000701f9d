//! Conversation message types shared by the Context Assembler, Provider, and
//! ReAct loop.
//!
//! `Message` carries one turn of conversation history. Tool invocations are
//! recorded as `Message::ToolUse` / `Message::ToolResult` so the full
//! transcript (including tool calls) round-trips through the Context
//! Assembler and back out to a `Provider` without a side channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in a conversation's message history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
    ToolUse(ToolCall),
    ToolResult(ToolResult),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Plain-text content for messages that carry one (`System`/`User`/`Assistant`).
    /// Tool variants have no single text body and return `None`.
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => Some(s.as_str()),
            Message::ToolUse(_) | Message::ToolResult(_) => None,
        }
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System(_) => "system",
            Message::User(_) => "user",
            Message::Assistant(_) => "assistant",
            Message::ToolUse(_) => "tool_use",
            Message::ToolResult(_) => "tool_result",
        }
    }

    /// Rough size estimate in characters, used by the Context Assembler's
    /// token-budget trimming before an exact tokenizer count is available.
    pub fn approx_len(&self) -> usize {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s.len(),
            Message::ToolUse(call) => call.name.len() + call.arguments.to_string().len(),
            Message::ToolResult(result) => result.content.len(),
        }
    }
}

/// A single tool invocation requested by the model in one Think turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Id assigned by the provider; threads a `ToolResult` back to its call.
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Outcome of executing one `ToolCall`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub tool_name: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(call_id: impl Into<String>, tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_role_and_text() {
        let m = Message::user("hi");
        assert_eq!(m.role(), "user");
        assert_eq!(m.text(), Some("hi"));
    }

    #[test]
    fn tool_variants_have_no_text() {
        let call = Message::ToolUse(ToolCall {
            id: "1".into(),
            name: "search".into(),
            arguments: serde_json::json!({"q": "rust"}),
        });
        assert_eq!(call.text(), None);
        assert_eq!(call.role(), "tool_use");
    }

    #[test]
    fn tool_result_constructors_set_is_error() {
        let ok = ToolResult::ok("1", "search", "done");
        let err = ToolResult::error("1", "search", "boom");
        assert!(!ok.is_error);
        assert!(err.is_error);
    }
}
