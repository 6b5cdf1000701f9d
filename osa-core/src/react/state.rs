//! State threaded through the ReAct graph's classify → think → act → observe
//! → compress cycle (spec §4.5).

use crate::message::{Message, ToolCall, ToolResult};
use crate::provider::ProviderUsage;
use crate::signal::Signal;

/// How many of the most recent think turns are kept for doom-loop detection
/// (spec §4.5 "doom-loop detection"): if this many consecutive turns issue
/// the same tool call with no new information, the loop is stuck repeating
/// itself.
pub const DOOM_LOOP_WINDOW: usize = 3;

#[derive(Clone, Debug)]
pub struct ReactState {
    pub session_id: String,
    pub channel: String,
    pub messages: Vec<Message>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,

    /// Set by the classify node; `None` only before classify has run.
    pub signal: Option<Signal>,
    /// Set by the classify node when the Noise Filter drops the turn.
    pub dropped: bool,
    /// Set by the classify node when `signal.weight` crosses
    /// `plan_mode_threshold` (spec §4.5 "plan-mode short-circuit before act").
    pub plan_mode: bool,

    /// Incremented once per think→act→observe cycle; checked against
    /// `max_iterations` by the conditional edge.
    pub iteration: u32,
    pub total_usage: ProviderUsage,
    /// Trailing window of tool-call signatures (`name` + canonicalized
    /// `arguments`), most recent last, for doom-loop detection. A turn with
    /// no tool calls does not push here, since a pure-text reply can't be a
    /// repeated tool_use.
    pub recent_tool_call_signatures: Vec<String>,
}

impl ReactState {
    pub fn new(session_id: impl Into<String>, channel: impl Into<String>, user_input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            channel: channel.into(),
            messages: vec![Message::user(user_input)],
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            signal: None,
            dropped: false,
            plan_mode: false,
            iteration: 0,
            total_usage: ProviderUsage::default(),
            recent_tool_call_signatures: Vec::new(),
        }
    }

    pub fn push_assistant_text(&mut self, text: String) {
        self.messages.push(Message::assistant(text));
    }

    /// Records the tool calls one think turn requested, for doom-loop
    /// detection. "The same tool_use three times in a row" means the same
    /// single call repeated each turn, not merely one matching call buried
    /// in a larger batch, so only single-call turns push a signature.
    pub fn push_tool_call_signature(&mut self, calls: &[ToolCall]) {
        let [call] = calls else {
            self.recent_tool_call_signatures.clear();
            return;
        };
        let signature = format!("{}:{}", call.name, call.arguments);
        self.recent_tool_call_signatures.push(signature);
        if self.recent_tool_call_signatures.len() > DOOM_LOOP_WINDOW {
            self.recent_tool_call_signatures.remove(0);
        }
    }

    /// `true` once the trailing window is full of an identical, repeated
    /// single tool call (spec §4.5 doom-loop detection scenario: "the model
    /// emits the same tool_use three times in a row with no new
    /// information").
    pub fn is_doom_looping(&self) -> bool {
        self.recent_tool_call_signatures.len() == DOOM_LOOP_WINDOW
            && self.recent_tool_call_signatures.windows(2).all(|w| w[0] == w[1])
    }

    pub fn last_user_text(&self) -> String {
        self.messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::User(s) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}
