//! ReAct Agent Loop (spec §4.5): classify → think → act → observe → compress
//! → think, compiled as a [`crate::graph::StateGraph`] over [`ReactState`].

mod act;
mod classify;
mod compress;
mod observe;
mod state;
mod think;

pub use act::ActNode;
pub use classify::ClassifyNode;
pub use compress::{CompressNode, CompressionConfig};
pub use observe::ObserveNode;
pub use state::ReactState;
pub use think::ThinkNode;

use std::sync::Arc;

use osa_config::OsaSettings;

use crate::budget::{BudgetLedger, TokenRate};
use crate::bus::Bus;
use crate::context::StaticBase;
use crate::error::OsaError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, StateGraph, END, START};
use crate::memory::Memory;
use crate::noise::NoiseFilter;
use crate::provider::Provider;
use crate::signal::Channel;
use crate::tools::{ApprovalGate, DenyAllGate, ToolRegistry};

/// Everything needed to build one ReAct graph instance. One `ReactBuildConfig`
/// is shared across sessions; the graph it compiles is stateless and reusable.
pub struct ReactBuildConfig {
    pub provider: Arc<dyn Provider>,
    pub tools: Arc<ToolRegistry>,
    pub static_base: Arc<StaticBase>,
    pub noise_filter: Arc<NoiseFilter>,
    pub approval_gate: Arc<dyn ApprovalGate>,
    pub channel: Channel,
    pub plan_mode_threshold: f64,
    pub tool_parallelism: usize,
    pub token_rate: TokenRate,
    pub daily_budget_usd: Option<f64>,
    pub per_call_budget_usd: Option<f64>,
    pub max_context_tokens: u32,
    pub response_reserve_tokens: u32,
    pub compression: CompressionConfig,
    pub memory: Option<Arc<dyn Memory>>,
    pub bus: Option<Bus>,
}

impl ReactBuildConfig {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, static_base: Arc<StaticBase>) -> Self {
        Self::from_settings(&OsaSettings::default(), provider, tools, static_base)
    }

    /// Builds a config from [`OsaSettings`], the enumerated runtime knobs
    /// (spec §6 "Configuration"), rather than hand-picked literals.
    pub fn from_settings(
        settings: &OsaSettings,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        static_base: Arc<StaticBase>,
    ) -> Self {
        Self {
            provider,
            tools,
            static_base,
            noise_filter: Arc::new(NoiseFilter::new(settings.noise_filter_threshold)),
            approval_gate: Arc::new(DenyAllGate),
            channel: Channel::Chat,
            plan_mode_threshold: settings.plan_mode_threshold,
            tool_parallelism: settings.tool_parallelism as usize,
            token_rate: TokenRate {
                prompt_usd_per_1k: 0.0,
                completion_usd_per_1k: 0.0,
            },
            daily_budget_usd: settings.daily_budget_usd,
            per_call_budget_usd: settings.per_call_budget_usd,
            max_context_tokens: settings.max_context_tokens,
            response_reserve_tokens: settings.response_reserve_tokens,
            compression: CompressionConfig {
                keep_recent: 20,
                max_iterations: settings.max_iterations,
            },
            memory: None,
            bus: None,
        }
    }

    /// Returns a copy of this config wired to `bus`, so every node it builds
    /// emits onto the same Event Bus a server session reads from.
    pub fn with_bus(&self, bus: Bus) -> Self {
        Self {
            bus: Some(bus),
            ..self.with_tools(self.tools.clone())
        }
    }

    /// Returns a copy of this config with its tool registry replaced, for
    /// role-scoped sub-agents that only see `tools_needed` (spec §4.6).
    pub fn with_tools(&self, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider: self.provider.clone(),
            tools,
            static_base: self.static_base.clone(),
            noise_filter: self.noise_filter.clone(),
            approval_gate: self.approval_gate.clone(),
            channel: self.channel,
            plan_mode_threshold: self.plan_mode_threshold,
            tool_parallelism: self.tool_parallelism,
            token_rate: self.token_rate,
            daily_budget_usd: self.daily_budget_usd,
            per_call_budget_usd: self.per_call_budget_usd,
            max_context_tokens: self.max_context_tokens,
            response_reserve_tokens: self.response_reserve_tokens,
            compression: self.compression.clone(),
            memory: self.memory.clone(),
            bus: self.bus.clone(),
        }
    }
}

/// Builds the compiled classify→think→act→observe→compress graph.
pub fn build_graph(config: &ReactBuildConfig) -> Result<CompiledStateGraph<ReactState>, CompilationError> {
    let budget = Arc::new(BudgetLedger::new(config.daily_budget_usd, config.per_call_budget_usd));

    let mut graph = StateGraph::<ReactState>::new();
    graph
        .add_node(
            "classify",
            Arc::new(ClassifyNode {
                noise_filter: config.noise_filter.clone(),
                channel: config.channel,
                plan_mode_threshold: config.plan_mode_threshold,
                bus: config.bus.clone(),
            }),
        )
        .add_node(
            "think",
            Arc::new(ThinkNode {
                provider: config.provider.clone(),
                tools: config.tools.clone(),
                static_base: config.static_base.clone(),
                budget,
                token_rate: config.token_rate,
                max_context_tokens: config.max_context_tokens,
                response_reserve_tokens: config.response_reserve_tokens,
                memory: config.memory.clone(),
                bus: config.bus.clone(),
            }),
        )
        .add_node(
            "act",
            Arc::new(ActNode {
                registry: config.tools.clone(),
                approval_gate: config.approval_gate.clone(),
                tool_parallelism: config.tool_parallelism,
                bus: config.bus.clone(),
            }),
        )
        .add_node("observe", Arc::new(ObserveNode))
        .add_node(
            "compress",
            Arc::new(CompressNode {
                config: config.compression.clone(),
                bus: config.bus.clone(),
            }),
        );

    graph
        .add_edge(START, "classify")
        .add_edge("classify", "think")
        .add_conditional_edges(
            "think",
            Arc::new(|state: &ReactState| {
                if state.tool_calls.is_empty() || state.plan_mode {
                    END.to_string()
                } else {
                    "act".to_string()
                }
            }),
            None,
        )
        .add_edge("act", "observe")
        .add_edge("observe", "compress");
    // compress routes back to "think" or to END via Next::Node/Next::End
    // returned directly from CompressNode::run, so it carries no static edge.

    graph.compile()
}

/// Runs one full turn of the ReAct loop for `user_input` against a freshly
/// compiled graph, returning the final state (its last assistant message is
/// the reply, unless `dropped` is set by the Noise Filter).
pub async fn run(
    config: &ReactBuildConfig,
    session_id: &str,
    user_input: &str,
) -> Result<ReactState, OsaError> {
    let graph = build_graph(config).map_err(OsaError::Graph)?;
    let channel_name = match config.channel {
        Channel::Cli => "cli",
        Channel::Chat => "chat",
        Channel::Webhook => "webhook",
        Channel::File => "file",
    };
    let state = ReactState::new(session_id, channel_name, user_input);
    graph.invoke(state).await
}
