//! # osa-core
//!
//! The OSA core runtime: the Signal Classifier and Noise Filter, the Context
//! Assembler, the ReAct agent loop, the multi-agent Orchestrator, the Tool
//! Registry, the Event Bus, and Session lifecycle management. One shared
//! state type flows through each graph's nodes (classify/think/act/observe/
//! compress for the ReAct loop; plan/execute/synthesize for the
//! Orchestrator), built on the generic [`graph::StateGraph`] executor.
//!
//! ## Design principles
//!
//! - **Single state type per graph**: each graph (e.g. [`react::ReactState`])
//!   is read and written by every node that runs in it.
//! - **One step per node**: each node receives state and returns updated
//!   state plus a routing decision ([`graph::Next`]).
//! - **Provider-agnostic**: the ReAct loop depends only on [`provider::Provider`],
//!   never a specific vendor SDK.
//! - **Memory is bring-your-own**: [`memory::Memory`] is the interface Context
//!   and the loop consume; [`memory::InMemoryMemory`] is the reference
//!   implementation for tests and demos, not a production backend.
//!
//! ## Main modules
//!
//! - [`signal`] — Signal Classifier: pure, deterministic 5-tuple classification.
//! - [`noise`] — Noise Filter: the Tier 1/Tier 2 pass/drop gate.
//! - [`context`] — Context Assembler: Static Base + tiered Dynamic Context.
//! - [`react`] — ReAct Agent Loop: classify → think → act → observe → compress.
//! - [`orchestrator`] — multi-agent decomposition, wave execution, synthesis.
//! - [`tools`] / [`tool_source`] — Tool Registry & Execution.
//! - [`bus`] — Event Bus: topic-based pub/sub over [`osa_protocol::OsaEvent`].
//! - [`session`] — Session Lifecycle: registry, idle-timeout reaping.
//! - [`memory`] — the Memory interface and an in-process reference impl.
//! - [`provider`] — the LLM backend trait and [`provider::MockProvider`].
//! - [`graph`] — the generic state-graph executor both loops compile down to.
//! - [`budget`] — per-call/per-day USD cost-budget enforcement.
//! - [`stream`] — streaming primitives (`StreamWriter`, `StreamEvent`, `StreamMode`).

pub mod budget;
pub mod bus;
pub mod channels;
pub mod context;
pub mod error;
pub mod graph;
pub mod memory;
pub mod message;
pub mod model_spec;
pub mod noise;
pub mod orchestrator;
pub mod provider;
pub mod react;
pub mod session;
pub mod signal;
pub mod stream;
pub mod tool_source;
pub mod tools;

pub use error::OsaError;
pub use graph::{CompiledStateGraph, Node, NodeMiddleware, RunContext, StateGraph};
pub use message::{Message, ToolCall, ToolResult};

/// When running `cargo test -p osa-core`, initializes tracing from `RUST_LOG`
/// so unit tests across `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
