//! Session Lifecycle (spec §4.8): per-session state isolation, an
//! idle-timeout reaper, and the `session_opened` / `session_closed` /
//! `session_idle_timeout` events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::bus::Bus;
use crate::message::Message;
use crate::provider::ProviderUsage;

/// Owned, mutated only by the one controller task currently running this
/// session's turn (spec §5 "Per-session mutable state is accessed by exactly
/// one controller task at a time").
#[derive(Debug, Default)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub iteration_count: u32,
    pub active_request_id: Option<String>,
    pub usage: ProviderUsage,
    /// Cancellation for the turn currently in flight, if any. Distinct from
    /// [`Session::cancellation`] (which tears down the whole session): spec
    /// §5 "Cancel(session_id) transitions any non-terminal state to
    /// Cancelled" cancels only the active turn, leaving the session open for
    /// the next Submit.
    pub turn_cancellation: Option<CancellationToken>,
}

/// A session: an isolated state container plus its cancellation handle.
pub struct Session {
    pub id: String,
    pub channel: String,
    pub state: Mutex<SessionState>,
    pub cancellation: CancellationToken,
    last_active: Mutex<Instant>,
}

impl Session {
    fn new(id: String, channel: String) -> Self {
        Self {
            id,
            channel,
            state: Mutex::new(SessionState::default()),
            cancellation: CancellationToken::new(),
            last_active: Mutex::new(Instant::now()),
        }
    }

    async fn touch(&self) {
        *self.last_active.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_active.lock().await.elapsed()
    }

    /// Begins a new turn if none is active: records `request_id` and a fresh
    /// [`CancellationToken`], returning it. Returns `None` if a turn is
    /// already in flight (spec §5 "submitting while active returns `busy`").
    pub async fn begin_turn(&self, request_id: String) -> Option<CancellationToken> {
        let mut state = self.state.lock().await;
        if state.active_request_id.is_some() {
            return None;
        }
        let token = CancellationToken::new();
        state.active_request_id = Some(request_id);
        state.turn_cancellation = Some(token.clone());
        Some(token)
    }

    /// Cancels the in-flight turn, if any. Idempotent (spec §5 "Cancellation
    /// is idempotent").
    pub async fn cancel_turn(&self) -> bool {
        let state = self.state.lock().await;
        match &state.turn_cancellation {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Clears the active-turn bookkeeping once a turn finishes, whether it
    /// completed, errored, or was cancelled.
    pub async fn end_turn(&self) {
        let mut state = self.state.lock().await;
        state.active_request_id = None;
        state.turn_cancellation = None;
    }
}

/// Process-wide session registry. `Open` returns an existing session or
/// creates one; cross-session state access is impossible by construction —
/// callers only ever hold the `Arc<Session>` for the session they opened.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<Session>>>,
    bus: Bus,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(bus: Bus, idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            bus,
            idle_timeout,
        }
    }

    /// `Open(session_id?)`: returns the existing session for `session_id`,
    /// or creates one (generating an id if none is given).
    pub fn open(&self, session_id: Option<String>, channel: &str) -> Arc<Session> {
        let id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if let Some(existing) = self.sessions.get(&id) {
            return existing.clone();
        }
        let session = Arc::new(Session::new(id.clone(), channel.to_string()));
        self.sessions.insert(id.clone(), session.clone());
        self.bus.emit(osa_protocol::OsaEvent::system(
            &id,
            "session_opened",
            serde_json::json!({"channel": channel}),
        ));
        session
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    pub async fn touch(&self, session_id: &str) {
        if let Some(session) = self.get(session_id) {
            session.touch().await;
        }
    }

    /// `Close(session_id)`: cancels the active turn and drops the session.
    pub fn close(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            session.cancellation.cancel();
            self.bus.emit(osa_protocol::OsaEvent::system(
                session_id,
                "session_closed",
                serde_json::json!({}),
            ));
        }
    }

    /// Sweeps sessions idle longer than the configured timeout, closing each
    /// and emitting `session_idle_timeout` before `session_closed`. Intended
    /// to run on a periodic interval from the hosting binary.
    pub async fn reap_idle(&self) -> Vec<String> {
        let mut idle_ids = Vec::new();
        let snapshot: HashMap<String, Arc<Session>> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (id, session) in snapshot {
            if session.idle_for().await >= self.idle_timeout {
                idle_ids.push(id);
            }
        }
        for id in &idle_ids {
            self.bus
                .emit(osa_protocol::OsaEvent::system(id, "session_idle_timeout", serde_json::json!({})));
            self.close(id);
        }
        idle_ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
