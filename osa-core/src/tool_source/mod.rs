//! Shared wire types for one tool call: its spec, its arguments context, its
//! result, and the error cases a call site must handle (spec §4.7 Tool
//! Registry & Execution).

mod context;

pub use context::ToolCallContext;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// `(name, description, parameters: JSON-Schema)` — the part of a
/// [`crate::tools::Tool`] the model sees. Registration is keyed by `name`
/// and is idempotent: registering the same name again replaces the prior
/// definition (spec §3 `ToolDefinition`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
    /// When `true`, execution suspends for out-of-band approval before the
    /// handler runs (spec §4.7 "Permission gating").
    #[serde(default)]
    pub requires_permission: bool,
}

/// Successful tool execution output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallContent {
    pub text: String,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Error, Debug, Clone)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error("tool panicked: {0}")]
    Panicked(String),

    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("permission request timed out for {0}")]
    PermissionTimeout(String),

    #[error("transport error: {0}")]
    Transport(String),
}
