//! Task DAG types for the Orchestrator's decomposition contract (spec §4.6):
//! a user task is decomposed into a `TaskGraph` of sub-agent `TaskNode`s with
//! dependency edges.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub description: String,
    /// Free-text role the planner assigned this sub-agent (spec §4.6
    /// decomposition contract); `None` runs with the orchestrator's default
    /// sub-agent config.
    #[serde(default)]
    pub role: Option<String>,
    /// Tool names this sub-agent is scoped to; empty means no restriction.
    #[serde(default)]
    pub tools_needed: Vec<String>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: description.into(),
            role: None,
            tools_needed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGraph {
    pub nodes: Vec<TaskNode>,
    /// (from_id, to_id): from must complete before to can run.
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskNodeState {
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_node_state_default_is_pending() {
        assert_eq!(TaskNodeState::default().status, TaskStatus::Pending);
    }
}
