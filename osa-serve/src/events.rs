//! SSE stream endpoint (spec §6 "For each session an external consumer may
//! open a read stream receiving newline-delimited JSON events ... Each event
//! includes a monotonically increasing sequence number per `(session_id)` to
//! allow resumption").
//!
//! This is a live tail, not a persisted log: `since` lets a resumed
//! connection skip envelopes it has already seen *from this point forward*,
//! matching the Bus's own per-subscriber bounded backlog rather than
//! replaying history the process no longer holds.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::stream;
use serde::Deserialize;

use crate::app::AppState;
use osa_core::bus::Topic;

#[derive(Deserialize)]
pub struct EventsQuery {
    /// Skip envelopes whose sequence number is `<= since`.
    since: Option<u64>,
}

pub async fn stream(
    Path(session_id): Path<String>,
    Query(query): Query<EventsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let subscription = state.bus.subscribe(Topic::Session(session_id));
    let sequence = state.sequence.clone();
    let since = query.since.unwrap_or(0);

    let body_stream = stream::unfold((subscription, sequence, since), |(sub, sequence, since)| async move {
        loop {
            let event = sub.recv().await;
            let envelope = sequence.envelope(event);
            if envelope.seq <= since {
                continue;
            }
            let line = match envelope.to_ndjson_line() {
                Ok(mut line) => {
                    line.push('\n');
                    line
                }
                Err(_) => continue,
            };
            return Some((Ok::<_, Infallible>(line), (sub, sequence, since)));
        }
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(body_stream))
        .unwrap()
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path as AxumPath, Query as AxumQuery};
    use osa_core::bus::Bus;
    use osa_core::context::StaticBase;
    use osa_core::provider::MockProvider;
    use osa_core::react::ReactBuildConfig;
    use osa_core::session::SessionRegistry;
    use osa_core::tools::ToolRegistry;
    use osa_protocol::OsaEvent;
    use std::time::Duration;

    fn state() -> Arc<AppState> {
        let bus = Bus::new();
        let sessions = SessionRegistry::new(bus.clone(), Duration::from_secs(300));
        let config = Arc::new(ReactBuildConfig::new(
            Arc::new(MockProvider::fixed("hi")),
            Arc::new(ToolRegistry::new()),
            Arc::new(StaticBase::render("base", &[])),
        ));
        Arc::new(AppState::new(sessions, bus, config, None))
    }

    #[tokio::test]
    async fn stream_response_has_ndjson_content_type() {
        let state = state();
        let response = stream(
            AxumPath("s1".to_string()),
            AxumQuery(EventsQuery { since: None }),
            State(state),
        )
        .await;
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-ndjson"
        );
    }

    #[tokio::test]
    async fn emitted_events_reach_a_subscriber_before_the_handler_runs() {
        let state = state();
        // Sanity-check the underlying bus plumbing the handler relies on,
        // since draining axum's streaming body in a unit test needs a real
        // HTTP client (covered by the crate's integration tests instead).
        let sub = state.bus.subscribe(Topic::Session("s1".to_string()));
        state.bus.emit(OsaEvent::system("s1", "test", serde_json::json!({})));
        let event = sub.recv().await;
        assert_eq!(event.session_id(), "s1");
    }
}
