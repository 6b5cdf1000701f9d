//! Aggregated error type for the OSA core runtime.
//!
//! Every module (`signal`, `noise`, `context`, `provider`, `tools`, `react`,
//! `orchestrator`, `memory`, `bus`, `session`) defines its own `thiserror` enum;
//! `OsaError` wraps them so `react::run` and `orchestrator::run` can return a
//! single error type across node boundaries, matching how `StateGraph<S>` needs
//! one `Err` type per graph.

use thiserror::Error;

use crate::graph::CompilationError;
use crate::memory::MemoryError;
use crate::provider::ProviderError;
use crate::tools::ToolSourceError;

#[derive(Error, Debug)]
pub enum OsaError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("tool error: {0}")]
    Tool(#[from] ToolSourceError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("graph compile error: {0}")]
    Graph(#[from] CompilationError),

    #[error("context assembly error: {0}")]
    Context(String),

    #[error("orchestrator error: {0}")]
    Orchestrator(String),

    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    #[error("iteration cap reached after {0} turns without a final answer")]
    IterationCapReached(u32),

    #[error("doom loop detected: {0}")]
    DoomLoop(String),

    #[error("run cancelled")]
    Cancelled,

    #[error("session error: {0}")]
    Session(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl OsaError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
