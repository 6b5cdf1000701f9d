//! Observe node: appends each `ToolResult` from the Act stage to the message
//! transcript, in call order, then clears them (spec §4.5, spec §5 "tool_result
//! messages within a turn appear in the order of the original tool_use calls").

use async_trait::async_trait;

use crate::error::OsaError;
use crate::graph::{Next, Node};
use crate::message::Message;

use super::state::ReactState;

pub struct ObserveNode;

#[async_trait]
impl Node<ReactState> for ObserveNode {
    fn id(&self) -> &str {
        "observe"
    }

    async fn run(&self, mut state: ReactState) -> Result<(ReactState, Next), OsaError> {
        for result in std::mem::take(&mut state.tool_results) {
            state.messages.push(Message::ToolResult(result));
        }
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolResult;

    #[tokio::test]
    async fn observe_appends_results_in_order_then_clears() {
        let mut state = ReactState::new("s1", "chat", "hi");
        state.tool_results = vec![
            ToolResult::ok("1", "search", "first"),
            ToolResult::ok("2", "search", "second"),
        ];
        let (out, next) = ObserveNode.run(state).await.unwrap();
        assert!(matches!(next, Next::Continue));
        assert!(out.tool_results.is_empty());
        let texts: Vec<&str> = out
            .messages
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult(r) => Some(r.content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }
}
