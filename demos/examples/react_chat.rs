//! Runs a single ReAct turn (classify -> think -> compress) against a
//! `MockProvider`, end to end, with no tools involved.

use std::sync::Arc;

use osa_core::context::StaticBase;
use osa_core::provider::MockProvider;
use osa_core::react::{self, ReactBuildConfig};
use osa_core::tools::ToolRegistry;

#[tokio::main]
async fn main() {
    let provider = Arc::new(MockProvider::fixed(
        "I looked into the outage: the deploy at 14:02 UTC rolled back automatically.",
    ));
    let static_base = Arc::new(StaticBase::render(
        "You are OSA, a helpful on-call assistant.",
        &[],
    ));
    let config = ReactBuildConfig::new(provider, Arc::new(ToolRegistry::new()), static_base);

    let state = react::run(&config, "demo-session", "What happened with the outage last night?")
        .await
        .expect("turn runs to completion");

    if state.dropped {
        println!("(noise filter dropped this turn)");
        return;
    }
    let reply = state.messages.iter().rev().find_map(|m| m.text()).unwrap_or("<no reply>");
    println!("assistant: {reply}");
    println!(
        "usage: {} prompt / {} completion tokens",
        state.total_usage.prompt_tokens, state.total_usage.completion_tokens
    );
}
