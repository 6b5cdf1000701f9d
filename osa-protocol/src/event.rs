//! Wire shape of a single Event Bus event (spec §3 `Event`, §6 SSE stream).
//!
//! `OsaEvent` is the tagged union every Bus emission and every SSE line carries.
//! Every variant carries at least `session_id` and `timestamp`, per the spec's
//! data-model invariant for `Event`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One classified/dispatched event flowing through the Event Bus.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` gives each variant the
/// exact `event_type` string spec §3/§8 refers to (`signal_classified`,
/// `tool_call_start`, ...).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OsaEvent {
    UserMessage {
        session_id: String,
        timestamp: DateTime<Utc>,
        channel: String,
        text: String,
    },
    SignalClassified {
        session_id: String,
        timestamp: DateTime<Utc>,
        mode: String,
        genre: String,
        kind: String,
        format: String,
        weight: f64,
    },
    LlmRequest {
        session_id: String,
        timestamp: DateTime<Utc>,
        model: String,
        iteration: u32,
    },
    LlmResponse {
        session_id: String,
        timestamp: DateTime<Utc>,
        model: String,
        iteration: u32,
        tool_call_count: usize,
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    ToolCallStart {
        session_id: String,
        timestamp: DateTime<Utc>,
        call_id: String,
        name: String,
    },
    ToolCallEnd {
        session_id: String,
        timestamp: DateTime<Utc>,
        call_id: String,
        name: String,
        is_error: bool,
        duration_ms: u64,
    },
    ToolResult {
        session_id: String,
        timestamp: DateTime<Utc>,
        call_id: String,
        content: String,
        is_error: bool,
    },
    AgentResponse {
        session_id: String,
        timestamp: DateTime<Utc>,
        text: String,
        usage_prompt_tokens: u32,
        usage_completion_tokens: u32,
        duration_ms: u64,
        model: String,
    },
    OrchestratorAgentProgress {
        session_id: String,
        timestamp: DateTime<Utc>,
        task_id: String,
        agent_id: String,
        tool_use_count: u32,
        tokens_used: u32,
        current_action: Option<String>,
    },
    SystemEvent {
        session_id: String,
        timestamp: DateTime<Utc>,
        event: String,
        detail: Value,
    },
}

impl OsaEvent {
    /// The `session_id` every variant carries.
    pub fn session_id(&self) -> &str {
        match self {
            OsaEvent::UserMessage { session_id, .. }
            | OsaEvent::SignalClassified { session_id, .. }
            | OsaEvent::LlmRequest { session_id, .. }
            | OsaEvent::LlmResponse { session_id, .. }
            | OsaEvent::ToolCallStart { session_id, .. }
            | OsaEvent::ToolCallEnd { session_id, .. }
            | OsaEvent::ToolResult { session_id, .. }
            | OsaEvent::AgentResponse { session_id, .. }
            | OsaEvent::OrchestratorAgentProgress { session_id, .. }
            | OsaEvent::SystemEvent { session_id, .. } => session_id,
        }
    }

    /// The event-kind discriminant used for `type:<T>` bus subscriptions.
    pub fn kind(&self) -> &'static str {
        match self {
            OsaEvent::UserMessage { .. } => "user_message",
            OsaEvent::SignalClassified { .. } => "signal_classified",
            OsaEvent::LlmRequest { .. } => "llm_request",
            OsaEvent::LlmResponse { .. } => "llm_response",
            OsaEvent::ToolCallStart { .. } => "tool_call_start",
            OsaEvent::ToolCallEnd { .. } => "tool_call_end",
            OsaEvent::ToolResult { .. } => "tool_result",
            OsaEvent::AgentResponse { .. } => "agent_response",
            OsaEvent::OrchestratorAgentProgress { .. } => "orchestrator_agent_progress",
            OsaEvent::SystemEvent { .. } => "system_event",
        }
    }

    pub fn system(session_id: impl Into<String>, event: &str, detail: Value) -> Self {
        OsaEvent::SystemEvent {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            event: event.to_string(),
            detail,
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
