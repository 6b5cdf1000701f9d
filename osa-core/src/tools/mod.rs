//! Tool Registry & Execution (spec §4.7): the `Tool` trait, a concurrent
//! registry with schema validation / permission gating / panic capture, and
//! the bounded-parallel dispatch helper the ReAct loop's Act stage uses.

mod registry;
mod schema;
#[allow(clippy::module_inception)]
mod r#trait;

pub use r#trait::Tool;
pub use registry::{AllowAllGate, ApprovalDecision, ApprovalGate, ApprovalScope, DenyAllGate, ToolRegistry};
pub use schema::{validate as validate_schema, ValidationError};
pub use crate::tool_source::ToolSourceError;

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::message::{ToolCall, ToolResult};
use crate::tool_source::ToolCallContext;

/// Partitions `calls` into sequential groups of mutually independent calls
/// (spec §4.5 "two ToolCalls in the same assistant turn are independent iff
/// neither's arguments reference the other's id"). A call that references
/// another call's id depends on it and is placed in a later group so it only
/// dispatches once that dependency's result exists; calls with no such
/// reference between them land in the same group and may run concurrently.
/// Returns index sets into `calls`, in dispatch order.
pub fn partition_independent_groups(calls: &[ToolCall]) -> Vec<Vec<usize>> {
    let depends_on: Vec<Vec<usize>> = calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            let args = call.arguments.to_string();
            calls
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && args.contains(other.id.as_str()))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut placed = vec![false; calls.len()];
    let mut groups = Vec::new();
    while placed.iter().any(|&p| !p) {
        let group: Vec<usize> = (0..calls.len())
            .filter(|&i| !placed[i] && depends_on[i].iter().all(|&d| placed[d]))
            .collect();
        if group.is_empty() {
            // A dependency cycle: dispatch everything left at once rather
            // than stall forever.
            let remaining: Vec<usize> = (0..calls.len()).filter(|&i| !placed[i]).collect();
            remaining.iter().for_each(|&i| placed[i] = true);
            groups.push(remaining);
            break;
        }
        group.iter().for_each(|&i| placed[i] = true);
        groups.push(group);
    }
    groups
}

/// Runs `calls` against `registry`, bounded to at most `parallelism`
/// concurrent executions, and returns results **in call order** regardless
/// of completion order (spec §5 "tool_result messages within a turn appear
/// in the order of the original tool_use calls, regardless of completion
/// order"). Calls are first partitioned into independent groups; each group
/// dispatches concurrently, and groups run one after another so a call that
/// references an earlier call's id never races it.
pub async fn dispatch_parallel(
    registry: Arc<ToolRegistry>,
    session_id: &str,
    calls: Vec<ToolCall>,
    ctx: Option<ToolCallContext>,
    gate: Arc<dyn ApprovalGate>,
    parallelism: usize,
) -> Vec<ToolResult> {
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let session_id = session_id.to_string();
    let groups = partition_independent_groups(&calls);

    let mut calls: Vec<Option<ToolCall>> = calls.into_iter().map(Some).collect();
    let mut results: Vec<Option<ToolResult>> = (0..calls.len()).map(|_| None).collect();

    for group in groups {
        let futures = group.into_iter().map(|idx| {
            let call = calls[idx].take().expect("each call index appears in exactly one group");
            let registry = registry.clone();
            let gate = gate.clone();
            let semaphore = semaphore.clone();
            let ctx = ctx.clone();
            let session_id = session_id.clone();
            async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                let result = registry
                    .execute(&session_id, &call.name, call.arguments.clone(), ctx.as_ref(), gate.as_ref())
                    .await;
                let result = match result {
                    Ok(content) => ToolResult::ok(call.id, call.name, content.text),
                    Err(err) => ToolResult::error(call.id, call.name, err.to_string()),
                };
                (idx, result)
            }
        });

        for (idx, result) in futures::future::join_all(futures).await {
            results[idx] = Some(result);
        }
    }

    results
        .into_iter()
        .map(|r| r.expect("every call index is assigned a result exactly once"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct SlowTool(u64);

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn spec(&self) -> crate::tool_source::ToolSpec {
            crate::tool_source::ToolSpec {
                name: "slow".into(),
                description: None,
                input_schema: json!({"type": "object"}),
                requires_permission: false,
            }
        }

        async fn call(
            &self,
            _args: serde_json::Value,
            _ctx: Option<&ToolCallContext>,
        ) -> Result<crate::tool_source::ToolCallContent, ToolSourceError> {
            tokio::time::sleep(std::time::Duration::from_millis(self.0)).await;
            Ok(crate::tool_source::ToolCallContent::text("done"))
        }
    }

    #[tokio::test]
    async fn dispatch_parallel_preserves_call_order_despite_variable_latency() {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(SlowTool(5))).await;

        let calls = vec![
            ToolCall {
                id: "1".into(),
                name: "slow".into(),
                arguments: json!({}),
            },
            ToolCall {
                id: "2".into(),
                name: "slow".into(),
                arguments: json!({}),
            },
            ToolCall {
                id: "3".into(),
                name: "slow".into(),
                arguments: json!({}),
            },
        ];

        let results = dispatch_parallel(registry, "s1", calls, None, Arc::new(DenyAllGate), 5).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].call_id, "1");
        assert_eq!(results[1].call_id, "2");
        assert_eq!(results[2].call_id, "3");
    }

    #[test]
    fn partition_independent_groups_splits_a_dependent_pair_into_two_groups() {
        let calls = vec![
            ToolCall {
                id: "1".into(),
                name: "slow".into(),
                arguments: json!({}),
            },
            ToolCall {
                id: "2".into(),
                name: "slow".into(),
                arguments: json!({"ref_id": "1"}),
            },
        ];
        let groups = partition_independent_groups(&calls);
        assert_eq!(groups, vec![vec![0], vec![1]]);
    }

    #[test]
    fn partition_independent_groups_keeps_unrelated_calls_in_one_group() {
        let calls = vec![
            ToolCall {
                id: "1".into(),
                name: "slow".into(),
                arguments: json!({}),
            },
            ToolCall {
                id: "2".into(),
                name: "slow".into(),
                arguments: json!({}),
            },
        ];
        let groups = partition_independent_groups(&calls);
        assert_eq!(groups, vec![vec![0, 1]]);
    }

    #[tokio::test]
    async fn dispatch_parallel_runs_a_dependent_call_only_after_the_call_it_references() {
        struct OrderTracker {
            order: Arc<std::sync::Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl Tool for OrderTracker {
            fn name(&self) -> &str {
                "track"
            }

            fn spec(&self) -> crate::tool_source::ToolSpec {
                crate::tool_source::ToolSpec {
                    name: "track".into(),
                    description: None,
                    input_schema: json!({"type": "object"}),
                    requires_permission: false,
                }
            }

            async fn call(
                &self,
                args: serde_json::Value,
                _ctx: Option<&ToolCallContext>,
            ) -> Result<crate::tool_source::ToolCallContent, ToolSourceError> {
                let id = args["id"].as_str().unwrap_or_default().to_string();
                if id == "1" {
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                }
                self.order.lock().unwrap().push(id);
                Ok(crate::tool_source::ToolCallContent::text("done"))
            }
        }

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(Arc::new(OrderTracker { order: order.clone() }))
            .await;

        let calls = vec![
            ToolCall {
                id: "1".into(),
                name: "track".into(),
                arguments: json!({"id": "1"}),
            },
            ToolCall {
                id: "2".into(),
                name: "track".into(),
                arguments: json!({"id": "2", "ref_id": "1"}),
            },
        ];

        dispatch_parallel(registry, "s1", calls, None, Arc::new(DenyAllGate), 5).await;
        assert_eq!(*order.lock().unwrap(), vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn dispatch_parallel_caps_concurrency() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct TrackingTool {
            current: Arc<AtomicUsize>,
            max_seen: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl Tool for TrackingTool {
            fn name(&self) -> &str {
                "track"
            }

            fn spec(&self) -> crate::tool_source::ToolSpec {
                crate::tool_source::ToolSpec {
                    name: "track".into(),
                    description: None,
                    input_schema: json!({"type": "object"}),
                    requires_permission: false,
                }
            }

            async fn call(
                &self,
                _args: serde_json::Value,
                _ctx: Option<&ToolCallContext>,
            ) -> Result<crate::tool_source::ToolCallContent, ToolSourceError> {
                let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                self.current.fetch_sub(1, Ordering::SeqCst);
                Ok(crate::tool_source::ToolCallContent::text("done"))
            }
        }

        let current = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ToolRegistry::new());
        registry
            .register(Arc::new(TrackingTool {
                current: current.clone(),
                max_seen: max_seen.clone(),
            }))
            .await;

        let calls = (0..6)
            .map(|i| ToolCall {
                id: i.to_string(),
                name: "track".into(),
                arguments: json!({}),
            })
            .collect();

        dispatch_parallel(registry, "s1", calls, None, Arc::new(DenyAllGate), 2).await;
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }
}
