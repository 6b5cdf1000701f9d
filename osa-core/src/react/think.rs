//! Think node: assembles context, calls the Provider, writes the assistant
//! message plus any tool calls it requested (spec §4.5).

use std::sync::Arc;

use async_trait::async_trait;
use osa_protocol::OsaEvent;

use crate::budget::{BudgetLedger, TokenRate};
use crate::bus::Bus;
use crate::context::{self, AssembleRequest, StaticBase};
use crate::error::OsaError;
use crate::graph::{Next, Node};
use crate::memory::Memory;
use crate::provider::{Provider, ProviderRequest, ToolChoiceMode};
use crate::tools::ToolRegistry;

use super::state::ReactState;

pub struct ThinkNode {
    pub provider: Arc<dyn Provider>,
    pub tools: Arc<ToolRegistry>,
    pub static_base: Arc<StaticBase>,
    pub budget: Arc<BudgetLedger>,
    pub token_rate: TokenRate,
    pub max_context_tokens: u32,
    pub response_reserve_tokens: u32,
    pub memory: Option<Arc<dyn Memory>>,
    pub bus: Option<Bus>,
}

impl ThinkNode {
    fn environment_block(&self) -> String {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        format!(
            "cwd: {cwd}\nos: {}\nprovider: {}",
            std::env::consts::OS,
            self.provider.model_id(),
        )
    }

    /// Tier-2 block listing the tools available this turn, so the model's
    /// plan (and the Orchestrator's decomposition, when it reads this same
    /// assembler) can reference them by name (spec §4.4 Tier-2).
    async fn tools_block(&self) -> Option<String> {
        let specs = self.tools.list().await;
        if specs.is_empty() {
            return None;
        }
        let lines: Vec<String> = specs
            .iter()
            .map(|s| match &s.description {
                Some(desc) => format!("- {}: {}", s.name, desc),
                None => format!("- {}", s.name),
            })
            .collect();
        Some(format!("available tools:\n{}", lines.join("\n")))
    }
}

#[async_trait]
impl Node<ReactState> for ThinkNode {
    fn id(&self) -> &str {
        "think"
    }

    async fn run(&self, mut state: ReactState) -> Result<(ReactState, Next), OsaError> {
        let signal = state
            .signal
            .clone()
            .ok_or_else(|| OsaError::Context("think ran before classify".into()))?;

        let conversation_tokens: u32 = state.messages.iter().map(|m| m.approx_len() as u32 / 4).sum();

        let plan_mode_block = state
            .plan_mode
            .then(|| "plan mode: respond with a plan; do not call tools this turn".to_string());

        let tier2_blocks: Vec<String> = self.tools_block().await.into_iter().collect();

        let tier3_blocks: Vec<String> = match &self.memory {
            Some(memory) => match memory.recall_relevant(&state.session_id, &state.last_user_text(), 512).await {
                Ok(recall) if !recall.is_empty() => vec![recall],
                _ => Vec::new(),
            },
            None => Vec::new(),
        };

        let system_blocks = context::assemble(
            &self.static_base,
            &AssembleRequest {
                signal: &signal,
                session_id: &state.session_id,
                channel: &state.channel,
                plan_mode_block,
                environment_block: self.environment_block(),
                tier2_blocks,
                tier3_blocks,
                tier4_blocks: Vec::new(),
                max_context_tokens: self.max_context_tokens,
                response_reserve_tokens: self.response_reserve_tokens,
                conversation_tokens,
            },
        );

        let mut messages = Vec::with_capacity(system_blocks.len() + state.messages.len());
        messages.extend(system_blocks.into_iter().map(|b| crate::message::Message::system(b.text)));
        messages.extend(state.messages.clone());

        let specs = self.tools.list().await;
        let tool_choice = if specs.is_empty() || state.plan_mode {
            ToolChoiceMode::None
        } else {
            ToolChoiceMode::Auto
        };
        let request = ProviderRequest::new(messages).with_tools(specs, tool_choice);

        let estimated_cost = self.token_rate.prompt_usd_per_1k * (conversation_tokens as f64 / 1000.0);
        self.budget
            .check_call(estimated_cost)
            .map_err(|e| OsaError::BudgetExceeded(e.to_string()))?;

        if let Some(bus) = &self.bus {
            bus.emit(OsaEvent::LlmRequest {
                session_id: state.session_id.clone(),
                timestamp: chrono::Utc::now(),
                model: self.provider.model_id().to_string(),
                iteration: state.iteration,
            });
        }

        let response = self.provider.invoke(request).await?;

        if let Some(usage) = &response.usage {
            state.total_usage.add(usage);
            self.budget.record(self.token_rate.cost(usage));
        }

        if let Some(bus) = &self.bus {
            bus.emit(OsaEvent::LlmResponse {
                session_id: state.session_id.clone(),
                timestamp: chrono::Utc::now(),
                model: self.provider.model_id().to_string(),
                iteration: state.iteration,
                tool_call_count: response.tool_calls.len(),
                prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
                completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
            });
        }

        state.tool_calls = response.tool_calls;
        let tool_calls = state.tool_calls.clone();
        state.push_tool_call_signature(&tool_calls);
        if !response.content.is_empty() || state.tool_calls.is_empty() {
            state.push_assistant_text(response.content);
        }
        state.iteration += 1;

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use crate::signal::{classify, Channel};

    fn think_node(provider: Arc<dyn Provider>) -> ThinkNode {
        ThinkNode {
            provider,
            tools: Arc::new(ToolRegistry::new()),
            static_base: Arc::new(StaticBase::render("base", &[])),
            budget: Arc::new(BudgetLedger::new(None, None)),
            token_rate: TokenRate {
                prompt_usd_per_1k: 0.01,
                completion_usd_per_1k: 0.03,
            },
            max_context_tokens: 8192,
            response_reserve_tokens: 512,
            memory: None,
            bus: None,
        }
    }

    #[tokio::test]
    async fn think_writes_assistant_message_and_bumps_iteration() {
        let mut state = ReactState::new("s1", "chat", "what time is it");
        state.signal = Some(classify("what time is it", Channel::Chat));
        let provider = Arc::new(MockProvider::fixed("it is noon"));
        let (out, next) = think_node(provider).run(state).await.unwrap();
        assert!(matches!(next, Next::Continue));
        assert_eq!(out.iteration, 1);
        assert!(out.messages.iter().any(|m| m.text() == Some("it is noon")));
    }

    #[tokio::test]
    async fn think_without_classify_errors() {
        let state = ReactState::new("s1", "chat", "hi");
        let provider = Arc::new(MockProvider::fixed("hi"));
        let result = think_node(provider).run(state).await;
        assert!(matches!(result, Err(OsaError::Context(_))));
    }
}
