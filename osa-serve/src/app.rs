//! Axum app: shared state and router (spec §6 "External Interfaces").

use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use osa_core::bus::Bus;
use osa_core::orchestrator::Orchestrator;
use osa_core::react::ReactBuildConfig;
use osa_core::session::SessionRegistry;
use osa_protocol::SequenceState;
use tokio::sync::oneshot;

use crate::{events, session_runner};

/// Shared, cheaply-clonable server state. One `AppState` backs the whole
/// process; every request handler reaches the Bus, the session registry, and
/// the ReAct build config it needs through this.
pub struct AppState {
    pub sessions: SessionRegistry,
    pub bus: Bus,
    pub sequence: SequenceState,
    pub react_config: Arc<ReactBuildConfig>,
    pub orchestrator: Option<Arc<Orchestrator>>,
    /// Set when the server is run in "once" mode (tests): fires after the
    /// first submitted turn finishes, so the caller can bind an ephemeral
    /// port, drive one request, and shut the listener down deterministically.
    pub(crate) shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl AppState {
    pub fn new(
        sessions: SessionRegistry,
        bus: Bus,
        react_config: Arc<ReactBuildConfig>,
        orchestrator: Option<Arc<Orchestrator>>,
    ) -> Self {
        let react_config = Arc::new(react_config.with_bus(bus.clone()));
        Self {
            sessions,
            bus,
            sequence: SequenceState::new(),
            react_config,
            orchestrator,
            shutdown_tx: Mutex::new(None),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions/:id/submit", post(session_runner::submit))
        .route("/sessions/:id/cancel", post(session_runner::cancel))
        .route("/sessions/:id/events", get(events::stream))
        .with_state(state)
}
