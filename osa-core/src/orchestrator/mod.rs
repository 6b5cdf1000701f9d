//! Orchestrator (spec §4.6): decomposes a user task into a `TaskGraph`,
//! executes it wave by wave with bounded-parallel ReAct sub-agents, then
//! synthesizes one final answer.

mod task_graph;
mod wave;

pub use task_graph::{TaskGraph, TaskNode, TaskNodeState, TaskStatus};
pub use wave::{build_waves, Waves};

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::OsaError;
use crate::provider::{Provider, ProviderRequest};
use crate::react::{self, ReactBuildConfig};
use crate::tools::ToolRegistry;

/// JSON decomposition contract the planning call must produce (spec §4.6
/// "JSON decomposition contract"): `{"nodes": [{"id","name","description",
/// "role","tools_needed","depends_on"}], "edges": [["from","to"]]}`. `edges`
/// and each node's `depends_on` are both accepted and merged, since planners
/// observed in the wild favor one or the other.
#[derive(Deserialize)]
struct DecompositionResponse {
    nodes: Vec<DecompositionNode>,
    #[serde(default)]
    edges: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct DecompositionNode {
    id: String,
    #[serde(default)]
    name: String,
    description: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    tools_needed: Vec<String>,
    #[serde(default)]
    depends_on: Vec<String>,
}

pub struct Orchestrator {
    pub planner: Arc<dyn Provider>,
    pub synthesizer: Arc<dyn Provider>,
    pub sub_agent_config: Arc<ReactBuildConfig>,
    pub wave_parallelism: usize,
    /// Upper bound on sub-agents a single decomposition may spawn (spec §4.6
    /// `N_max_agents`, default 5). Extra nodes are dropped, along with any
    /// edge that references a dropped node.
    pub max_agents: usize,
}

impl Orchestrator {
    /// Calls `planner` with a fixed decomposition prompt and parses its JSON
    /// reply into a `TaskGraph`, bounded to `max_agents` nodes. A single-node
    /// graph is returned if the model's output doesn't parse, so a run never
    /// silently does nothing.
    pub async fn decompose(&self, task: &str) -> Result<TaskGraph, OsaError> {
        let prompt = format!(
            "Decompose the following task into a JSON object with \"nodes\" \
             (each {{\"id\", \"name\", \"description\", \"role\", \"tools_needed\", \
             \"depends_on\"}}) and \"edges\" (each [from_id, to_id] meaning from must \
             finish before to). Respond with JSON only.\n\nTask: {task}"
        );
        let response = self
            .planner
            .invoke(ProviderRequest::new(vec![crate::message::Message::user(prompt)]))
            .await?;

        match serde_json::from_str::<DecompositionResponse>(&response.content) {
            Ok(parsed) => {
                let mut nodes: Vec<DecompositionNode> = parsed.nodes;
                if nodes.len() > self.max_agents {
                    nodes.truncate(self.max_agents);
                }
                let kept_ids: std::collections::HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

                let mut edges: Vec<(String, String)> = parsed
                    .edges
                    .into_iter()
                    .filter(|(from, to)| kept_ids.contains(from.as_str()) && kept_ids.contains(to.as_str()))
                    .collect();
                for node in &nodes {
                    for dep in &node.depends_on {
                        if kept_ids.contains(dep.as_str()) {
                            edges.push((dep.clone(), node.id.clone()));
                        }
                    }
                }
                edges.sort();
                edges.dedup();

                Ok(TaskGraph {
                    nodes: nodes
                        .into_iter()
                        .map(|n| TaskNode {
                            name: if n.name.is_empty() { n.id.clone() } else { n.name },
                            id: n.id,
                            description: n.description,
                            role: n.role,
                            tools_needed: n.tools_needed,
                        })
                        .collect(),
                    edges,
                })
            }
            Err(_) => Ok(TaskGraph {
                nodes: vec![TaskNode::new("task", task)],
                edges: vec![],
            }),
        }
    }

    /// Runs every node in `graph` wave by wave, each wave bounded to
    /// `wave_parallelism` concurrent sub-agents (spec §4.6 "bounded parallel
    /// execution per wave via `futures::future::join_all`"). Downstream nodes
    /// get their upstream dependencies' results folded into their prompt, and
    /// nodes with `tools_needed` run against a registry scoped to only those
    /// tools.
    pub async fn execute(&self, session_id: &str, graph: &TaskGraph) -> HashMap<String, TaskNodeState> {
        let waves = build_waves(graph);
        let nodes: HashMap<&str, &TaskNode> = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let mut dependents_of: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in &graph.edges {
            dependents_of.entry(to.clone()).or_default().push(from.clone());
        }

        let mut states: HashMap<String, TaskNodeState> = graph
            .nodes
            .iter()
            .map(|n| (n.id.clone(), TaskNodeState::default()))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.wave_parallelism.max(1)));
        for wave in &waves.waves {
            let mut futures = Vec::with_capacity(wave.len());
            for id in wave {
                let Some(&node) = nodes.get(id.as_str()) else { continue };
                let prompt = self.build_prompt(node, dependents_of.get(id.as_str()), &states);
                let config = if node.tools_needed.is_empty() {
                    self.sub_agent_config.clone()
                } else {
                    Arc::new(self.scoped_sub_agent_config(node).await)
                };
                let semaphore = semaphore.clone();
                let session_id = format!("{session_id}:{id}");
                let id = id.clone();
                futures.push(async move {
                    let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                    let result = react::run(&config, &session_id, &prompt).await;
                    (id, result)
                });
            }

            let results = futures::future::join_all(futures).await;
            for (id, result) in results {
                let state = match result {
                    Ok(react_state) => TaskNodeState {
                        status: TaskStatus::Done,
                        result: react_state
                            .messages
                            .iter()
                            .rev()
                            .find_map(|m| m.text())
                            .map(str::to_string),
                        error: None,
                    },
                    Err(err) => TaskNodeState {
                        status: TaskStatus::Failed,
                        result: None,
                        error: Some(err.to_string()),
                    },
                };
                states.insert(id, state);
            }
        }

        states
    }

    /// Prepends any completed upstream-dependency results to `node`'s
    /// description so a downstream-wave sub-agent sees what its dependencies
    /// produced, not just its own task text.
    fn build_prompt(&self, node: &TaskNode, deps: Option<&Vec<String>>, states: &HashMap<String, TaskNodeState>) -> String {
        let Some(deps) = deps else {
            return node.description.clone();
        };
        let mut deps: Vec<&String> = deps.iter().collect();
        deps.sort();
        let context = deps
            .into_iter()
            .filter_map(|dep_id| states.get(dep_id).and_then(|s| s.result.as_deref()).map(|r| format!("[{dep_id}] {r}")))
            .collect::<Vec<_>>()
            .join("\n");
        if context.is_empty() {
            node.description.clone()
        } else {
            format!("{}\n\nContext from prior steps:\n{}", node.description, context)
        }
    }

    /// Builds a clone of `sub_agent_config` whose tool registry only contains
    /// `node.tools_needed`, so a sub-agent assigned a role only sees the
    /// tools the planner scoped it to. Unknown tool names are skipped.
    async fn scoped_sub_agent_config(&self, node: &TaskNode) -> ReactBuildConfig {
        let scoped = ToolRegistry::new();
        for name in &node.tools_needed {
            if let Some(tool) = self.sub_agent_config.tools.get(name).await {
                scoped.register(tool).await;
            }
        }
        self.sub_agent_config.with_tools(Arc::new(scoped))
    }

    /// Synthesizes one final answer from `states`. Calls `synthesizer` with
    /// every node's result; on provider failure, falls back to a
    /// deterministic concatenation so a run always produces an answer (spec
    /// §4.6 "Synthesis LLM call with deterministic-concatenation fallback").
    pub async fn synthesize(&self, task: &str, states: &HashMap<String, TaskNodeState>) -> String {
        let mut ordered: Vec<(&String, &TaskNodeState)> = states.iter().collect();
        ordered.sort_by_key(|(id, _)| id.as_str());

        let summary = ordered
            .iter()
            .map(|(id, s)| match &s.result {
                Some(r) => format!("[{id}] {r}"),
                None => format!("[{id}] (failed: {})", s.error.clone().unwrap_or_default()),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!("Synthesize one final answer to \"{task}\" from these sub-task results:\n\n{summary}");
        let request = ProviderRequest::new(vec![crate::message::Message::user(prompt)]);

        match self.synthesizer.invoke(request).await {
            Ok(response) if !response.content.is_empty() => response.content,
            _ => summary,
        }
    }
}

pub mod swarm {
    //! Thin orchestration-strategy wrappers over [`Orchestrator::execute`],
    //! each expressible as one `TaskGraph` shape (spec §4.6 "Swarm patterns").

    use super::{TaskGraph, TaskNode};

    /// All nodes run concurrently with no dependencies.
    pub fn parallel_graph(descriptions: &[&str]) -> TaskGraph {
        TaskGraph {
            nodes: descriptions
                .iter()
                .enumerate()
                .map(|(i, d)| TaskNode::new(format!("n{i}"), *d))
                .collect(),
            edges: vec![],
        }
    }

    /// Each node depends on the previous one, so they run strictly in order.
    pub fn pipeline_graph(descriptions: &[&str]) -> TaskGraph {
        let nodes: Vec<TaskNode> = descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| TaskNode::new(format!("n{i}"), *d))
            .collect();
        let edges = nodes.windows(2).map(|w| (w[0].id.clone(), w[1].id.clone())).collect();
        TaskGraph { nodes, edges }
    }

    /// Two opposing positions argue in parallel, then a judge node reads both.
    pub fn debate_graph(position_a: &str, position_b: &str, judge: &str) -> TaskGraph {
        TaskGraph {
            nodes: vec![
                TaskNode::new("a", position_a),
                TaskNode::new("b", position_b),
                TaskNode::new("judge", judge),
            ],
            edges: vec![("a".into(), "judge".into()), ("b".into(), "judge".into())],
        }
    }

    /// A draft node feeds `rounds` sequential review nodes, one per round.
    pub fn review_loop_graph(draft: &str, review: &str, rounds: usize) -> TaskGraph {
        let mut nodes = vec![TaskNode::new("draft", draft)];
        let mut edges = Vec::new();
        let mut previous = "draft".to_string();
        for i in 0..rounds {
            let id = format!("review{i}");
            nodes.push(TaskNode::new(id.clone(), review));
            edges.push((previous.clone(), id.clone()));
            previous = id;
        }
        TaskGraph { nodes, edges }
    }
}
