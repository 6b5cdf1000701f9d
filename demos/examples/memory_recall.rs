//! Exercises the `Memory` interface directly: remember a few facts, then
//! recall and search them back, scoped to one session.

use osa_core::memory::{InMemoryMemory, Memory, SearchOptions};

#[tokio::main]
async fn main() {
    let memory = InMemoryMemory::new();

    memory
        .remember("demo-session", "the user's timezone is UTC+1", "preference")
        .await
        .expect("remember");
    memory
        .remember("demo-session", "the last deploy was at 14:02 UTC", "fact")
        .await
        .expect("remember");

    let recalled = memory.recall("demo-session").await.expect("recall");
    println!("recall:\n{recalled}\n");

    let relevant = memory
        .recall_relevant("demo-session", "deploy", 200)
        .await
        .expect("recall_relevant");
    println!("recall_relevant(\"deploy\"):\n{relevant}\n");

    let found = memory
        .search(
            "demo-session",
            "timezone",
            &SearchOptions {
                category: Some("preference".to_string()),
                limit: Some(5),
            },
        )
        .await
        .expect("search");
    for entry in found {
        println!("found: [{}] {}", entry.category, entry.content);
    }

    // Another session's memory is never visible here.
    let other = memory.recall("other-session").await.expect("recall");
    assert!(other.is_empty() || !other.contains("timezone"));
}
