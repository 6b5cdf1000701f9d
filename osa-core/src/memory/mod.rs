//! Memory Interface (spec §3 "Memory Interface"): the abstract store Context
//! and the Loop consume for recall/remember/session I/O. Concrete persistent
//! backends (SQLite, append-only session logs, a synthesized bulletin file)
//! are explicitly out of scope — callers bring their own `Memory` impl; this
//! module ships only the trait and an in-process reference implementation
//! for tests and demos.

mod in_memory;

pub use in_memory::InMemoryMemory;

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("storage: {0}")]
    Storage(String),
}

/// One remembered fact, returned by `Search`.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryEntry {
    pub content: String,
    pub category: String,
}

#[derive(Clone, Debug, Default)]
pub struct SearchOptions {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// Recall/remember/session-I/O, scoped per session unless a call explicitly
/// crosses sessions (spec §4.8 "Cross-session state access is forbidden").
#[async_trait]
pub trait Memory: Send + Sync {
    /// `Recall() -> text`: a compact summary of everything remembered for
    /// `session_id`, suitable for direct inclusion in context.
    async fn recall(&self, session_id: &str) -> Result<String, MemoryError>;

    /// `RecallRelevant(query, max_tokens) -> text`: a query-scoped, token-
    /// budgeted subset of recall.
    async fn recall_relevant(
        &self,
        session_id: &str,
        query: &str,
        max_tokens: u32,
    ) -> Result<String, MemoryError>;

    /// `Remember(content, category)`.
    async fn remember(&self, session_id: &str, content: &str, category: &str) -> Result<(), MemoryError>;

    /// `Search(query, opts) -> [entry]`.
    async fn search(&self, session_id: &str, query: &str, opts: &SearchOptions) -> Result<Vec<MemoryEntry>, MemoryError>;

    /// `LoadSession(session_id) -> [Message]`.
    async fn load_session(&self, session_id: &str) -> Result<Vec<Message>, MemoryError>;

    /// `AppendMessage(session_id, message)`.
    async fn append_message(&self, session_id: &str, message: Message) -> Result<(), MemoryError>;
}
