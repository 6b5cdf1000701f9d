//! Runs a ReAct turn that calls one tool: think -> act -> observe -> think,
//! ending on a final plain-text answer once the tool result comes back.

use std::sync::Arc;

use async_trait::async_trait;
use osa_core::context::StaticBase;
use osa_core::message::ToolCall;
use osa_core::provider::{MockProvider, ProviderResponse};
use osa_core::react::{self, ReactBuildConfig};
use osa_core::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use osa_core::tools::{Tool, ToolRegistry};
use serde_json::{json, Value};

struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "current_time".to_string(),
            description: Some("Returns a fixed demo timestamp".to_string()),
            input_schema: json!({"type": "object", "properties": {}}),
            requires_permission: false,
        }
    }

    async fn call(&self, _args: Value, _ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        Ok(ToolCallContent::text("2026-07-28T00:00:00Z"))
    }
}

#[tokio::main]
async fn main() {
    let provider = Arc::new(MockProvider::new(
        "mock-model",
        vec![
            ProviderResponse {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call-1".to_string(),
                    name: "current_time".to_string(),
                    arguments: json!({}),
                }],
                ..Default::default()
            },
            ProviderResponse {
                content: "It's 2026-07-28T00:00:00Z right now.".to_string(),
                ..Default::default()
            },
        ],
    ));

    let tools = Arc::new(ToolRegistry::new());
    tools.register(Arc::new(ClockTool)).await;

    let static_base = Arc::new(StaticBase::render("You are OSA.", &[]));
    let config = ReactBuildConfig::new(provider, tools, static_base);

    let state = react::run(&config, "demo-session", "what time is it?").await.expect("turn runs");

    for message in &state.messages {
        if let Some(text) = message.text() {
            println!("{}: {text}", message.role());
        }
    }
}
