//! Context passed into a `Tool::call` invocation for the current step
//! (spec §4.7). `ActNode` builds one per Act stage from the state's current
//! messages.

use crate::message::Message;
use crate::stream::ToolStreamWriter;

/// Per-step context available to tools during execution. Most tools ignore
/// it; memory-backed tools that need the live conversation (e.g. a
/// "recent messages" lookup) read `recent_messages`.
#[derive(Debug, Clone, Default)]
pub struct ToolCallContext {
    /// Messages in the conversation as of the current step.
    pub recent_messages: Vec<Message>,
    /// Set when streaming is enabled, so a tool can emit progress events.
    pub stream_writer: Option<ToolStreamWriter>,
    pub thread_id: Option<String>,
    pub user_id: Option<String>,
}

impl ToolCallContext {
    pub fn new(recent_messages: Vec<Message>) -> Self {
        Self {
            recent_messages,
            stream_writer: None,
            thread_id: None,
            user_id: None,
        }
    }

    pub fn with_stream_writer(recent_messages: Vec<Message>, stream_writer: ToolStreamWriter) -> Self {
        Self {
            recent_messages,
            stream_writer: Some(stream_writer),
            thread_id: None,
            user_id: None,
        }
    }

    /// Returns `true` if a writer was present and the event was sent.
    pub fn emit_custom(&self, value: serde_json::Value) -> bool {
        self.stream_writer
            .as_ref()
            .map(|w| w.emit_custom(value))
            .unwrap_or(false)
    }
}
