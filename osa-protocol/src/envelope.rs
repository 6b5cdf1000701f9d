//! SSE envelope: per-session monotonic sequence numbers for stream resumption
//! (spec §4.1 Bus dedup, §6 "SSE stream").
//!
//! Each subscriber stream is keyed by `session_id`. `SequenceState` hands out a
//! strictly increasing `seq` per session so a resumed SSE connection can replay
//! from the last seen `seq` without duplicating events, and the Bus can drop a
//! duplicate re-emission of the same `(event_type, session_id, seq)` triple.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::event::OsaEvent;
use serde::Serialize;
use serde_json::Value;

/// One line of the SSE stream: the event plus its resumption sequence number.
#[derive(Clone, Debug, Serialize)]
pub struct Envelope {
    pub session_id: String,
    pub seq: u64,
    #[serde(flatten)]
    pub event: OsaEvent,
}

impl Envelope {
    pub fn to_ndjson_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Per-session monotonic sequence counters, shared by the Bus's SSE bridge.
///
/// Cheap to clone: counters live behind `Arc` so every producer task sees the
/// same sequence space for a given session.
#[derive(Clone, Default)]
pub struct SequenceState {
    counters: Arc<dashmap::DashMap<String, Arc<AtomicU64>>>,
}

impl SequenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence number for `session_id`, starting at 1.
    pub fn next(&self, session_id: &str) -> u64 {
        let counter = self
            .counters
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone();
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Wraps an event with the next sequence number for its session.
    pub fn envelope(&self, event: OsaEvent) -> Envelope {
        let seq = self.next(event.session_id());
        Envelope {
            session_id: event.session_id().to_string(),
            seq,
            event,
        }
    }
}

/// Drops duplicate `(event_type, session_id, seq)` triples so a restart
/// mid-stream does not re-deliver an event to a resumed subscriber
/// (spec §4.1: "The Bus deduplicates external SSE emissions ...").
pub struct DedupFilter {
    seen: HashMap<(String, String, u64), ()>,
    capacity: usize,
    order: std::collections::VecDeque<(String, String, u64)>,
}

impl DedupFilter {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashMap::new(),
            capacity: capacity.max(1),
            order: std::collections::VecDeque::new(),
        }
    }

    /// Returns `true` if this envelope has not been seen before (i.e. should
    /// be delivered); records it either way.
    pub fn admit(&mut self, envelope: &Envelope) -> bool {
        let key = (
            envelope.event.kind().to_string(),
            envelope.session_id.clone(),
            envelope.seq,
        );
        if self.seen.contains_key(&key) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.seen.remove(&old);
            }
        }
        self.order.push_back(key.clone());
        self.seen.insert(key, ());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(session_id: &str) -> OsaEvent {
        OsaEvent::system(session_id, "test_event", json!({}))
    }

    #[test]
    fn sequence_increments_per_session() {
        let state = SequenceState::new();
        assert_eq!(state.next("a"), 1);
        assert_eq!(state.next("a"), 2);
        assert_eq!(state.next("b"), 1);
        assert_eq!(state.next("a"), 3);
    }

    #[test]
    fn envelope_carries_session_and_seq() {
        let state = SequenceState::new();
        let env = state.envelope(sample("sess-1"));
        assert_eq!(env.session_id, "sess-1");
        assert_eq!(env.seq, 1);
    }

    #[test]
    fn dedup_drops_repeat_triples() {
        let state = SequenceState::new();
        let mut dedup = DedupFilter::new(16);
        let env = state.envelope(sample("sess-1"));
        assert!(dedup.admit(&env));
        assert!(!dedup.admit(&env.clone()));
    }
}
