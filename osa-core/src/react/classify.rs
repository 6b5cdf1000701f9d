//! Classify node: runs the Signal Classifier and Noise Filter gate before
//! `think`, short-circuiting to `END` on drop (spec §4.5).

use std::sync::Arc;

use async_trait::async_trait;
use osa_protocol::OsaEvent;

use crate::bus::Bus;
use crate::error::OsaError;
use crate::graph::{Next, Node};
use crate::noise::NoiseFilter;
use crate::signal::{self, Channel};

use super::state::ReactState;

pub struct ClassifyNode {
    pub noise_filter: Arc<NoiseFilter>,
    pub channel: Channel,
    /// Signal weight at or above which the loop short-circuits before `act`
    /// and returns the assembled plan instead of executing tools (spec §4.5
    /// "plan-mode short-circuit before act").
    pub plan_mode_threshold: f64,
    pub bus: Option<Bus>,
}

#[async_trait]
impl Node<ReactState> for ClassifyNode {
    fn id(&self) -> &str {
        "classify"
    }

    async fn run(&self, mut state: ReactState) -> Result<(ReactState, Next), OsaError> {
        let raw = state.last_user_text();
        let signal = signal::classify(&raw, self.channel);
        let verdict = self.noise_filter.filter(&signal).await;

        state.plan_mode = signal.weight >= self.plan_mode_threshold;
        state.dropped = matches!(verdict, crate::noise::Verdict::Drop);

        if let Some(bus) = &self.bus {
            bus.emit(OsaEvent::SignalClassified {
                session_id: state.session_id.clone(),
                timestamp: chrono::Utc::now(),
                mode: format!("{:?}", signal.mode),
                genre: format!("{:?}", signal.genre),
                kind: format!("{:?}", signal.kind),
                format: format!("{:?}", signal.format),
                weight: signal.weight,
            });
            if state.dropped {
                bus.emit(OsaEvent::system(&state.session_id, "signal_filtered", serde_json::json!({})));
            }
        }

        state.signal = Some(signal);

        if state.dropped {
            Ok((state, Next::End))
        } else {
            Ok((state, Next::Continue))
        }
    }
}
