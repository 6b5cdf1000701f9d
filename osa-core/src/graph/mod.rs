//! Generic state-graph executor: nodes plus linear or conditional edges,
//! compiled once and then invoked with a state. Used by the ReAct loop and
//! the orchestrator to sequence their own node sets.

mod compile_error;
mod compiled;
mod conditional;
mod name_node;
mod next;
mod node;
mod node_middleware;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use name_node::NameNode;
pub use next::Next;
pub use node::Node;
pub use node_middleware::NodeMiddleware;
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
