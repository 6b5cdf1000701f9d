use async_trait::async_trait;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// A single tool the model can call. Implementations are registered with a
/// [`ToolRegistry`](crate::tools::ToolRegistry) under a unique name.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use osa_core::tools::Tool;
/// use osa_core::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
///
/// struct EchoTool;
///
/// #[async_trait]
/// impl Tool for EchoTool {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "echo".to_string(),
///             description: Some("Echoes its input back".to_string()),
///             input_schema: serde_json::json!({
///                 "type": "object",
///                 "properties": {"text": {"type": "string"}},
///                 "required": ["text"]
///             }),
///             requires_permission: false,
///         }
///     }
///
///     async fn call(
///         &self,
///         args: Value,
///         _ctx: Option<&ToolCallContext>,
///     ) -> Result<ToolCallContent, ToolSourceError> {
///         Ok(ToolCallContent::text(args["text"].as_str().unwrap_or_default()))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry; used to route `ToolCall::name`.
    fn name(&self) -> &str;

    /// Description and JSON-Schema parameters presented to the model, plus
    /// whether calls require out-of-band approval.
    fn spec(&self) -> ToolSpec;

    /// Executes with already schema-validated arguments.
    async fn call(
        &self,
        args: serde_json::Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError>;
}
