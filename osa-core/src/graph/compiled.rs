//! Executable graph produced by `StateGraph::compile`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::channels::{BoxedStateUpdater, StateUpdater};
use crate::error::OsaError;

use super::conditional::NextEntry;
use super::node::Node;
use super::node_middleware::NodeMiddleware;
use super::next::Next;
use super::run_context::RunContext;

pub struct CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) edge_order: Vec<String>,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Option<Arc<dyn NodeMiddleware<S>>>,
    pub(super) state_updater: BoxedStateUpdater<S>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Runs the graph to completion, starting at the entry node.
    pub async fn invoke(&self, state: S) -> Result<S, OsaError> {
        self.invoke_with_context(state, &RunContext::new("")).await
    }

    pub async fn invoke_with_context(&self, mut state: S, ctx: &RunContext<S>) -> Result<S, OsaError> {
        let mut current_id = self.first_node_id.clone();
        loop {
            let node = self
                .nodes
                .get(&current_id)
                .ok_or_else(|| OsaError::Graph(crate::graph::CompilationError::NodeNotFound(current_id.clone())))?
                .clone();

            tracing::debug!(node_id = %current_id, "graph node start");
            let (next_state, next) = self.run_node(node, state.clone(), ctx).await?;
            tracing::debug!(node_id = %current_id, "graph node complete");
            self.state_updater.apply_update(&mut state, &next_state);

            let next = match next {
                Next::End => break,
                Next::Node(id) => id,
                Next::Continue => match self.next_map.get(&current_id) {
                    Some(NextEntry::Unconditional(to)) => to.clone(),
                    Some(NextEntry::Conditional(router)) => router.resolve(&state),
                    None => break,
                },
            };

            if next == super::state_graph::END {
                break;
            }
            current_id = next;
        }
        Ok(state)
    }

    async fn run_node(&self, node: Arc<dyn Node<S>>, state: S, ctx: &RunContext<S>) -> Result<(S, Next), OsaError> {
        if let Some(middleware) = &self.middleware {
            let node_id = node.id().to_string();
            let inner_node = node.clone();
            middleware
                .around_run(
                    &node_id,
                    state,
                    Box::new(move |s| Box::pin(async move { inner_node.run(s).await })),
                )
                .await
        } else {
            node.run_with_context(state, ctx).await
        }
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.edge_order.iter().map(|s| s.as_str()).collect()
    }
}
