//! Reference `Memory` implementation: process-local, not persisted. Useful
//! for tests and for channel adapters that don't need durability.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::message::Message;

use super::{Memory, MemoryEntry, MemoryError, SearchOptions};

#[derive(Default, Clone)]
struct SessionMemory {
    messages: Vec<Message>,
    entries: Vec<MemoryEntry>,
}

/// Namespaced purely by `session_id` — there is no cross-session map to
/// accidentally index into, which is what makes cross-session access
/// structurally impossible rather than merely policy-forbidden.
pub struct InMemoryMemory {
    sessions: Arc<RwLock<HashMap<String, SessionMemory>>>,
}

impl Default for InMemoryMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMemory {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Memory for InMemoryMemory {
    async fn recall(&self, session_id: &str) -> Result<String, MemoryError> {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(session_id) else {
            return Ok(String::new());
        };
        Ok(session
            .entries
            .iter()
            .map(|e| format!("[{}] {}", e.category, e.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn recall_relevant(
        &self,
        session_id: &str,
        query: &str,
        max_tokens: u32,
    ) -> Result<String, MemoryError> {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(session_id) else {
            return Ok(String::new());
        };
        let query_lower = query.to_lowercase();
        let mut matched: Vec<&MemoryEntry> = session
            .entries
            .iter()
            .filter(|e| e.content.to_lowercase().contains(&query_lower))
            .collect();
        if matched.is_empty() {
            matched = session.entries.iter().collect();
        }
        let budget = (max_tokens as usize).max(1) * 4; // chars, matching context::estimate_tokens's inverse
        let mut out = String::new();
        for entry in matched {
            let line = format!("[{}] {}\n", entry.category, entry.content);
            if out.len() + line.len() > budget {
                break;
            }
            out.push_str(&line);
        }
        Ok(out)
    }

    async fn remember(&self, session_id: &str, content: &str, category: &str) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_default();
        session.entries.push(MemoryEntry {
            content: content.to_string(),
            category: category.to_string(),
        });
        Ok(())
    }

    async fn search(&self, session_id: &str, query: &str, opts: &SearchOptions) -> Result<Vec<MemoryEntry>, MemoryError> {
        let sessions = self.sessions.read().await;
        let Some(session) = sessions.get(session_id) else {
            return Ok(Vec::new());
        };
        let query_lower = query.to_lowercase();
        let mut hits: Vec<MemoryEntry> = session
            .entries
            .iter()
            .filter(|e| {
                let matches_query = query.is_empty() || e.content.to_lowercase().contains(&query_lower);
                let matches_category = match &opts.category {
                    Some(c) => *c == e.category,
                    None => true,
                };
                matches_query && matches_category
            })
            .cloned()
            .collect();
        if let Some(limit) = opts.limit {
            hits.truncate(limit);
        }
        Ok(hits)
    }

    async fn load_session(&self, session_id: &str) -> Result<Vec<Message>, MemoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).map(|s| s.messages.clone()).unwrap_or_default())
    }

    async fn append_message(&self, session_id: &str, message: Message) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().messages.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn remember_then_recall_returns_entry() {
        let mem = InMemoryMemory::new();
        mem.remember("s1", "likes terse answers", "preference").await.unwrap();
        let recalled = mem.recall("s1").await.unwrap();
        assert!(recalled.contains("likes terse answers"));
    }

    #[tokio::test]
    async fn recall_relevant_filters_by_query() {
        let mem = InMemoryMemory::new();
        mem.remember("s1", "prefers dark mode", "preference").await.unwrap();
        mem.remember("s1", "deploys on fridays", "habit").await.unwrap();
        let relevant = mem.recall_relevant("s1", "dark", 100).await.unwrap();
        assert!(relevant.contains("dark mode"));
        assert!(!relevant.contains("fridays"));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let mem = InMemoryMemory::new();
        mem.remember("s1", "only for s1", "note").await.unwrap();
        let recalled = mem.recall("s2").await.unwrap();
        assert!(recalled.is_empty());
    }

    #[tokio::test]
    async fn append_message_then_load_session_preserves_order() {
        let mem = InMemoryMemory::new();
        mem.append_message("s1", Message::user("first")).await.unwrap();
        mem.append_message("s1", Message::assistant("second")).await.unwrap();
        let messages = mem.load_session("s1").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), Some("first"));
        assert_eq!(messages[1].text(), Some("second"));
    }

    #[tokio::test]
    async fn search_respects_category_and_limit() {
        let mem = InMemoryMemory::new();
        mem.remember("s1", "a", "cat1").await.unwrap();
        mem.remember("s1", "b", "cat2").await.unwrap();
        mem.remember("s1", "c", "cat1").await.unwrap();
        let opts = SearchOptions { category: Some("cat1".to_string()), limit: Some(1) };
        let hits = mem.search("s1", "", &opts).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, "cat1");
    }
}
