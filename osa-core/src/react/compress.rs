//! Compress node: collapses old conversation history once it grows past
//! `keep_recent` messages, so the next `think` call doesn't resend an
//! unbounded transcript (spec §4.5 "think→act→observe→compress→think
//! cycle").
//!
//! Compaction collapses dropped messages into a single deterministic
//! summary line rather than issuing an extra provider call; there is no
//! pruning pass ahead of it, so this is the only history-shrinking step.

use async_trait::async_trait;

use crate::bus::Bus;
use crate::error::OsaError;
use crate::graph::{Next, Node};
use crate::message::Message;

use super::state::ReactState;

#[derive(Clone, Debug)]
pub struct CompressionConfig {
    /// Compaction only runs once the transcript exceeds this many messages.
    pub keep_recent: usize,
    pub max_iterations: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            keep_recent: 20,
            max_iterations: 20,
        }
    }
}

pub struct CompressNode {
    pub config: CompressionConfig,
    pub bus: Option<Bus>,
}

#[async_trait]
impl Node<ReactState> for CompressNode {
    fn id(&self) -> &str {
        "compress"
    }

    async fn run(&self, mut state: ReactState) -> Result<(ReactState, Next), OsaError> {
        if state.messages.len() > self.config.keep_recent {
            let cut = state.messages.len() - self.config.keep_recent;
            let dropped: Vec<&Message> = state.messages[..cut].iter().collect();
            let summary = format!(
                "[compressed {} earlier message(s)] last topic: {}",
                dropped.len(),
                dropped.last().and_then(|m| m.text()).unwrap_or("")
            );
            let mut messages = vec![Message::system(summary)];
            messages.extend(state.messages.split_off(cut));
            state.messages = messages;
        }

        if state.is_doom_looping() {
            if let Some(bus) = &self.bus {
                bus.emit(osa_protocol::OsaEvent::system(
                    &state.session_id,
                    "doom_loop",
                    serde_json::json!({"iteration": state.iteration}),
                ));
            }
            return Err(OsaError::DoomLoop(format!(
                "same tool call repeated {} times in a row",
                super::state::DOOM_LOOP_WINDOW
            )));
        }

        if state.iteration >= self.config.max_iterations {
            if let Some(bus) = &self.bus {
                bus.emit(osa_protocol::OsaEvent::system(
                    &state.session_id,
                    "max_iterations",
                    serde_json::json!({"iteration": state.iteration}),
                ));
            }
            Ok((state, Next::End))
        } else {
            Ok((state, Next::Node("think".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn compacts_when_over_keep_recent() {
        let node = CompressNode {
            config: CompressionConfig {
                keep_recent: 2,
                max_iterations: 25,
            },
            bus: None,
        };
        let mut state = ReactState::new("s1", "chat", "hello");
        state.messages.push(Message::assistant("a1"));
        state.messages.push(Message::user("u2"));
        state.messages.push(Message::assistant("a2"));
        let (out, _) = node.run(state).await.unwrap();
        assert_eq!(out.messages.len(), 3);
        assert!(out.messages[0].text().unwrap().contains("compressed"));
    }

    #[tokio::test]
    async fn routes_to_think_under_cap() {
        let node = CompressNode {
            config: CompressionConfig::default(),
            bus: None,
        };
        let state = ReactState::new("s1", "chat", "hello");
        let (_, next) = node.run(state).await.unwrap();
        assert!(matches!(next, Next::Node(id) if id == "think"));
    }

    #[tokio::test]
    async fn routes_to_end_at_iteration_cap() {
        let node = CompressNode {
            config: CompressionConfig {
                keep_recent: 20,
                max_iterations: 3,
            },
            bus: None,
        };
        let mut state = ReactState::new("s1", "chat", "hello");
        state.iteration = 3;
        let (_, next) = node.run(state).await.unwrap();
        assert!(matches!(next, Next::End));
    }

    #[tokio::test]
    async fn errors_with_doom_loop_instead_of_ending_silently() {
        let node = CompressNode {
            config: CompressionConfig::default(),
            bus: None,
        };
        let mut state = ReactState::new("s1", "chat", "hello");
        let signature = "search:{}".to_string();
        state.recent_tool_call_signatures = vec![signature.clone(), signature.clone(), signature];
        let err = node.run(state).await.unwrap_err();
        assert!(matches!(err, OsaError::DoomLoop(_)));
    }
}
