//! Provider abstraction: one async trait any LLM backend implements, so the
//! ReAct loop's Think node never depends on a specific vendor SDK.
//!
//! Generalizes a single-vendor `LlmClient`-style trait into a multi-provider
//! one: `ProviderRequest` carries the tool specs and tool-choice mode that used
//! to be threaded through ad hoc method arguments, and `ProviderError` folds
//! rate-limit/timeout/invalid-response cases into variants the ReAct loop can
//! branch on (retry vs. give up vs. surface to the caller).

mod mock;

pub use mock::MockProvider;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::message::{Message, ToolCall};
use crate::tools::ToolSpec;

/// Tool choice mode for one Think turn: whether the model may, must not, or
/// must call a tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolChoiceMode {
    #[default]
    Auto,
    None,
    Required,
}

/// One streamed token or content fragment from a provider.
#[derive(Clone, Debug)]
pub struct MessageChunk {
    pub content: String,
}

/// Incremental tool-call arguments streamed before the call is complete.
#[derive(Clone, Debug)]
pub struct ToolCallDelta {
    pub call_id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}

/// Token accounting for one provider call, used for cost-budget enforcement
/// (spec §6 `daily_budget_usd` / `per_call_budget_usd`) and cache-control
/// bookkeeping.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ProviderUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cached_tokens: u32,
    pub total_tokens: u32,
}

impl ProviderUsage {
    pub fn add(&mut self, other: &ProviderUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.cached_tokens += other.cached_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One call to a provider: assembled messages plus the tools currently on
/// offer and how the model should treat them.
#[derive(Clone, Debug)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub tool_choice: ToolChoiceMode,
}

impl ProviderRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tools: Vec::new(),
            tool_choice: ToolChoiceMode::Auto,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolSpec>, tool_choice: ToolChoiceMode) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }
}

/// Assistant turn produced by a provider: text plus any tool calls it wants
/// executed before it continues.
#[derive(Clone, Debug, Default)]
pub struct ProviderResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<ProviderUsage>,
    /// `true` when cache-control applies to the prefix of this request
    /// (spec §10 Open Question: opaque `Cacheable` marker, TTL left to the
    /// provider).
    pub cache_hit: bool,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider timed out after {0}ms")]
    Timeout(u64),

    #[error("provider returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("provider authentication failed: {0}")]
    Auth(String),

    #[error("provider transport error: {0}")]
    Transport(String),
}

/// One LLM backend. Implementations: [`MockProvider`] for tests/demos; real
/// backends (OpenAI/Anthropic-compatible) live outside this crate and are
/// wired in by the channel adapter or `osa-serve`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable id, e.g. `"openai:gpt-4o"`. Used in logs and usage events.
    fn model_id(&self) -> &str;

    /// Non-streaming call: full request in, full response out.
    async fn invoke(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Streaming call. When `chunk_tx` is `Some`, implementations send
    /// `MessageChunk`s as they arrive; the full `ProviderResponse` is still
    /// returned at the end so callers that don't care about streaming can
    /// ignore `chunk_tx`.
    ///
    /// Default implementation calls `invoke` and forwards the full content as
    /// one chunk, matching non-streaming backends.
    async fn invoke_stream(
        &self,
        request: ProviderRequest,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<ProviderResponse, ProviderError> {
        let response = self.invoke(request).await?;
        if let Some(tx) = chunk_tx {
            if !response.content.is_empty() {
                let _ = tx
                    .send(MessageChunk {
                        content: response.content.clone(),
                    })
                    .await;
            }
        }
        Ok(response)
    }

    /// Streaming call with incremental tool-call argument deltas. Default
    /// delegates to `invoke_stream` and emits no deltas.
    async fn invoke_stream_with_tool_delta(
        &self,
        request: ProviderRequest,
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
        _tool_delta_tx: Option<mpsc::Sender<ToolCallDelta>>,
    ) -> Result<ProviderResponse, ProviderError> {
        self.invoke_stream(request, chunk_tx).await
    }
}
