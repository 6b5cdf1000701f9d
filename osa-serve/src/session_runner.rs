//! `Submit`/`Cancel` control contract (spec §5): `Submit(session_id,
//! user_text) -> future<Response | Error>`, one active request per session,
//! `busy` if one is already running; `Cancel(session_id)` transitions the
//! active turn to `Cancelled` and is idempotent.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use osa_protocol::OsaEvent;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub session_id: String,
    pub request_id: String,
    pub status: &'static str,
}

/// Opens (or reuses) the session, rejects with `409 Busy` if a turn is
/// already in flight, then runs the ReAct loop in a detached task — the
/// caller observes progress over `/sessions/:id/events`, not this response.
pub async fn submit(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = state.sessions.open(Some(session_id.clone()), "webhook");
    let request_id = Uuid::new_v4().to_string();
    let Some(cancellation) = session.begin_turn(request_id.clone()).await else {
        return Err(ApiError::busy(session_id));
    };
    state.sessions.touch(&session_id).await;

    state.bus.emit(OsaEvent::UserMessage {
        session_id: session_id.clone(),
        timestamp: Utc::now(),
        channel: "webhook".to_string(),
        text: req.message.clone(),
    });

    let state = state.clone();
    let session = session.clone();
    let sid = session_id.clone();
    let message = req.message;
    tokio::spawn(async move {
        let outcome = tokio::select! {
            result = osa_core::react::run(&state.react_config, &sid, &message) => Some(result),
            _ = cancellation.cancelled() => None,
        };

        match outcome {
            // `ClassifyNode` already emitted `signal_filtered` on this same
            // bus when it dropped the turn; nothing further to report here.
            Some(Ok(react_state)) if react_state.dropped => {}
            Some(Ok(react_state)) => {
                let text = react_state
                    .messages
                    .iter()
                    .rev()
                    .find_map(|m| m.text())
                    .unwrap_or_default()
                    .to_string();
                state.bus.emit(OsaEvent::AgentResponse {
                    session_id: sid.clone(),
                    timestamp: Utc::now(),
                    text,
                    usage_prompt_tokens: react_state.total_usage.prompt_tokens,
                    usage_completion_tokens: react_state.total_usage.completion_tokens,
                    duration_ms: 0,
                    model: state.react_config.provider.model_id().to_string(),
                });
            }
            Some(Err(err)) => {
                warn!(session_id = %sid, error = %err, "turn failed");
                let event = match &err {
                    osa_core::error::OsaError::BudgetExceeded(_) => "budget_exceeded",
                    osa_core::error::OsaError::DoomLoop(_) => "doom_loop",
                    _ => "turn_error",
                };
                state
                    .bus
                    .emit(OsaEvent::system(&sid, event, serde_json::json!({"error": err.to_string()})));
            }
            None => {
                info!(session_id = %sid, "turn cancelled");
                state.bus.emit(OsaEvent::system(&sid, "cancelled", serde_json::json!({})));
            }
        }

        session.end_turn().await;
        if let Some(tx) = state.shutdown_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
    });

    Ok(Json(SubmitResponse {
        session_id,
        request_id,
        status: "accepted",
    }))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub session_id: String,
    pub cancelled: bool,
}

pub async fn cancel(
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<CancelResponse>, ApiError> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::not_found(session_id.clone()))?;
    let cancelled = session.cancel_turn().await;
    Ok(Json(CancelResponse { session_id, cancelled }))
}
