//! Act node: executes pending tool calls via the tool registry, bounded by
//! `tool_parallelism` (spec §4.5, §4.7).

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use osa_protocol::OsaEvent;

use crate::bus::Bus;
use crate::error::OsaError;
use crate::graph::{Next, Node};
use crate::tool_source::ToolCallContext;
use crate::tools::{dispatch_parallel, ApprovalGate, DenyAllGate, ToolRegistry};

use super::state::ReactState;

pub struct ActNode {
    pub registry: Arc<ToolRegistry>,
    pub approval_gate: Arc<dyn ApprovalGate>,
    pub tool_parallelism: usize,
    pub bus: Option<Bus>,
}

impl ActNode {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            approval_gate: Arc::new(DenyAllGate),
            tool_parallelism: 4,
            bus: None,
        }
    }
}

#[async_trait]
impl Node<ReactState> for ActNode {
    fn id(&self) -> &str {
        "act"
    }

    async fn run(&self, mut state: ReactState) -> Result<(ReactState, Next), OsaError> {
        if state.tool_calls.is_empty() {
            return Ok((state, Next::Continue));
        }

        if let Some(bus) = &self.bus {
            for call in &state.tool_calls {
                bus.emit(OsaEvent::ToolCallStart {
                    session_id: state.session_id.clone(),
                    timestamp: chrono::Utc::now(),
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                });
            }
        }

        let ctx = ToolCallContext::new(state.messages.clone());
        let started = Instant::now();
        let results = dispatch_parallel(
            self.registry.clone(),
            &state.session_id,
            std::mem::take(&mut state.tool_calls),
            Some(ctx),
            self.approval_gate.clone(),
            self.tool_parallelism,
        )
        .await;

        if let Some(bus) = &self.bus {
            let duration_ms = started.elapsed().as_millis() as u64;
            for result in &results {
                bus.emit(OsaEvent::ToolCallEnd {
                    session_id: state.session_id.clone(),
                    timestamp: chrono::Utc::now(),
                    call_id: result.call_id.clone(),
                    name: result.tool_name.clone(),
                    is_error: result.is_error,
                    duration_ms,
                });
                bus.emit(OsaEvent::ToolResult {
                    session_id: state.session_id.clone(),
                    timestamp: chrono::Utc::now(),
                    call_id: result.call_id.clone(),
                    content: result.content.clone(),
                    is_error: result.is_error,
                });
            }
        }

        state.tool_results = results;
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as at;
    use serde_json::json;

    use crate::message::ToolCall;
    use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};
    use crate::tools::Tool;

    struct Echo;

    #[at]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".into(),
                description: None,
                input_schema: json!({"type": "object"}),
                requires_permission: false,
            }
        }

        async fn call(
            &self,
            args: serde_json::Value,
            _ctx: Option<&ToolCallContext>,
        ) -> Result<ToolCallContent, ToolSourceError> {
            Ok(ToolCallContent::text(args.to_string()))
        }
    }

    #[tokio::test]
    async fn act_runs_pending_calls_and_clears_them() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(Echo)).await;
        let node = ActNode::new(registry);

        let mut state = ReactState::new("s1", "chat", "echo please");
        state.tool_calls = vec![ToolCall {
            id: "1".into(),
            name: "echo".into(),
            arguments: json!({"x": 1}),
        }];

        let (out, next) = node.run(state).await.unwrap();
        assert!(matches!(next, Next::Continue));
        assert!(out.tool_calls.is_empty());
        assert_eq!(out.tool_results.len(), 1);
        assert!(!out.tool_results[0].is_error);
    }

    #[tokio::test]
    async fn act_with_no_calls_is_a_no_op() {
        let registry = Arc::new(ToolRegistry::new());
        let node = ActNode::new(registry);
        let state = ReactState::new("s1", "chat", "hello");
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.tool_results.is_empty());
    }

    #[tokio::test]
    async fn act_emits_tool_call_events_on_the_bus() {
        use crate::bus::{Bus, Topic};

        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(Echo)).await;
        let bus = Bus::new();
        let node = ActNode {
            registry,
            approval_gate: Arc::new(DenyAllGate),
            tool_parallelism: 4,
            bus: Some(bus.clone()),
        };
        let sub = bus.subscribe(Topic::Session("s1".to_string()));

        let mut state = ReactState::new("s1", "chat", "echo please");
        state.tool_calls = vec![ToolCall {
            id: "1".into(),
            name: "echo".into(),
            arguments: json!({"x": 1}),
        }];
        node.run(state).await.unwrap();

        let mut kinds = Vec::new();
        for _ in 0..3 {
            let event = tokio::time::timeout(std::time::Duration::from_millis(200), sub.recv())
                .await
                .expect("event arrives");
            kinds.push(event.kind().to_string());
        }
        assert_eq!(kinds, vec!["tool_call_start", "tool_call_end", "tool_result"]);
    }
}
