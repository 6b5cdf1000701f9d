//! Tool Registry: holds the set of available tools and executes them by name
//! with schema validation, permission gating, and panic capture (spec §4.7).

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::schema;
use crate::tools::Tool;

/// Scope of a granted approval (spec §4.7 "Approvals may be once | session |
/// always").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalScope {
    Once,
    Session,
    Always,
}

#[derive(Clone, Debug)]
pub enum ApprovalDecision {
    Approved(ApprovalScope),
    Denied,
}

/// Out-of-band approval channel: the registry calls this when a
/// `requires_permission` tool is invoked and awaits the decision (or a
/// timeout). Implementations typically publish a `tool_permission_request`
/// event on the [`crate::bus::Bus`] and wait on an external response.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn request(&self, session_id: &str, tool_name: &str, args: &Value) -> ApprovalDecision;
}

/// An `ApprovalGate` that always denies; used when no approval channel is
/// wired up so `requires_permission` tools fail closed instead of silently
/// running.
pub struct DenyAllGate;

#[async_trait]
impl ApprovalGate for DenyAllGate {
    async fn request(&self, _session_id: &str, _tool_name: &str, _args: &Value) -> ApprovalDecision {
        ApprovalDecision::Denied
    }
}

/// An `ApprovalGate` that always approves once; useful for tests and demos.
pub struct AllowAllGate;

#[async_trait]
impl ApprovalGate for AllowAllGate {
    async fn request(&self, _session_id: &str, _tool_name: &str, _args: &Value) -> ApprovalDecision {
        ApprovalDecision::Approved(ApprovalScope::Once)
    }
}

/// Registered tools keyed by name. Reads are lock-free snapshots via a
/// cloned `Arc<dyn Tool>`; registration/unregistration takes a short write
/// lock (spec §5 "Tool Registry serializes writes; reads are lock-free
/// snapshots").
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
    /// `(session_id, tool_name) -> approved` cache for `session`/`always`
    /// scoped approvals. `always` entries use the session id `"*"`.
    approvals: DashMap<(String, String), ()>,
    approval_timeout: Duration,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            approvals: DashMap::new(),
            approval_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    /// Registers a tool, replacing any existing tool with the same name
    /// (spec §3 "registration is idempotent and may replace").
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().await;
        tools.insert(tool.name().to_string(), tool);
    }

    pub async fn unregister(&self, name: &str) {
        let mut tools = self.tools.write().await;
        tools.remove(name);
    }

    pub async fn list(&self) -> Vec<ToolSpec> {
        let tools = self.tools.read().await;
        tools.values().map(|t| t.spec()).collect()
    }

    /// Looks up a registered tool by name, for building role-scoped subset
    /// registries (spec §4.6 "sub-agents scoped to `tools_needed`").
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).cloned()
    }

    fn approval_key(session_id: &str, name: &str) -> (String, String) {
        (session_id.to_string(), name.to_string())
    }

    /// Validates args against the tool's schema, gates on permission if
    /// required, then calls the tool, capturing panics as errors.
    ///
    /// The registry never executes a tool whose name is not registered at
    /// the moment of call (spec §4.7 "Safety invariants") — lookup and call
    /// happen under the same read guard.
    pub async fn execute(
        &self,
        session_id: &str,
        name: &str,
        args: Value,
        ctx: Option<&ToolCallContext>,
        gate: &dyn ApprovalGate,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))?
        };

        let spec = tool.spec();
        if let Err(violations) = schema::validate(&spec.input_schema, &args) {
            let reason = violations
                .into_iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ToolSourceError::InvalidArguments {
                tool: name.to_string(),
                reason,
            });
        }

        if spec.requires_permission {
            self.gate_permission(session_id, name, &args, gate).await?;
        }

        let call_future = AssertUnwindSafe(tool.call(args, ctx)).catch_unwind();
        match call_future.await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(&panic);
                Err(ToolSourceError::Panicked(message))
            }
        }
    }

    async fn gate_permission(
        &self,
        session_id: &str,
        name: &str,
        args: &Value,
        gate: &dyn ApprovalGate,
    ) -> Result<(), ToolSourceError> {
        if self
            .approvals
            .contains_key(&Self::approval_key(session_id, name))
            || self.approvals.contains_key(&Self::approval_key("*", name))
        {
            return Ok(());
        }

        let decision = tokio::time::timeout(
            self.approval_timeout,
            gate.request(session_id, name, args),
        )
        .await
        .map_err(|_| ToolSourceError::PermissionTimeout(name.to_string()))?;

        match decision {
            ApprovalDecision::Approved(ApprovalScope::Once) => Ok(()),
            ApprovalDecision::Approved(ApprovalScope::Session) => {
                self.approvals.insert(Self::approval_key(session_id, name), ());
                Ok(())
            }
            ApprovalDecision::Approved(ApprovalScope::Always) => {
                self.approvals.insert(Self::approval_key("*", name), ());
                Ok(())
            }
            ApprovalDecision::Denied => Err(ToolSourceError::PermissionDenied(name.to_string())),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked with a non-string payload".to_string()
    }
}
