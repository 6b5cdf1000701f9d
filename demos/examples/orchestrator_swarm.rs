//! Decomposes a task into a three-node swarm (two parallel researchers feed
//! a synthesizer), runs it wave by wave, then synthesizes one final answer.

use std::sync::Arc;

use osa_core::context::StaticBase;
use osa_core::orchestrator::{swarm, Orchestrator};
use osa_core::provider::MockProvider;
use osa_core::react::ReactBuildConfig;
use osa_core::tools::ToolRegistry;

#[tokio::main]
async fn main() {
    let sub_agent_config = Arc::new(ReactBuildConfig::new(
        Arc::new(MockProvider::fixed("sub-agent finding")),
        Arc::new(ToolRegistry::new()),
        Arc::new(StaticBase::render("You are a research sub-agent.", &[])),
    ));

    let orchestrator = Orchestrator {
        planner: Arc::new(MockProvider::fixed("")),
        synthesizer: Arc::new(MockProvider::fixed(
            "Combining both branches: the outage was caused by a bad config push and is now resolved.",
        )),
        sub_agent_config,
        wave_parallelism: 4,
        max_agents: 5,
    };

    let graph = swarm::debate_graph(
        "argue the outage was caused by a config push",
        "argue the outage was caused by a hardware failure",
        "weigh both arguments and decide",
    );

    let states = orchestrator.execute("demo-session", &graph).await;
    for (id, state) in &states {
        println!("[{id}] {:?} -> {:?}", state.status, state.result);
    }

    let answer = orchestrator.synthesize("diagnose the outage", &states).await;
    println!("\nfinal answer: {answer}");
}
