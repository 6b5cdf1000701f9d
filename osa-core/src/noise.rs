//! Noise Filter (spec §4.3): a two-tier gate between the Signal Classifier
//! and the ReAct loop. Tier 1 is a deterministic O(1) pattern check; Tier 2
//! is an optional, disabled-by-default cheap-model fallback for borderline
//! weights.

use async_trait::async_trait;

use crate::signal::Signal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Drop,
}

const NOISE_PATTERNS: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "ok", "okay", "lol", "ack", "cool", "nice", "got it",
];

fn matches_noise_pattern(raw: &str) -> bool {
    let lower = raw.trim().to_lowercase();
    NOISE_PATTERNS.iter().any(|p| lower == *p || lower.starts_with(p))
}

/// A cheap adjudicator consulted only for borderline weights when Tier 2 is
/// enabled (spec §4.3 "optionally call a cheap adjudicator model with a
/// fixed yes/no prompt"). Kept as a trait so the filter has no hard
/// dependency on a specific provider.
#[async_trait]
pub trait Adjudicator: Send + Sync {
    /// Returns `true` if the message should pass through to the loop.
    async fn adjudicate(&self, signal: &Signal) -> bool;
}

pub struct NoiseFilter {
    pub threshold: f64,
    pub tier2_enabled: bool,
    pub tier2_margin: f64,
    pub tier2_budget: std::time::Duration,
    pub adjudicator: Option<std::sync::Arc<dyn Adjudicator>>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            tier2_enabled: false,
            tier2_margin: 0.1,
            tier2_budget: std::time::Duration::from_millis(800),
            adjudicator: None,
        }
    }
}

impl NoiseFilter {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    pub fn with_tier2(mut self, adjudicator: std::sync::Arc<dyn Adjudicator>) -> Self {
        self.tier2_enabled = true;
        self.adjudicator = Some(adjudicator);
        self
    }

    /// `Filter(signal) -> pass | drop`.
    pub async fn filter(&self, signal: &Signal) -> Verdict {
        if signal.weight < self.threshold && matches_noise_pattern(&signal.raw) {
            return Verdict::Drop;
        }

        if self.tier2_enabled {
            let lower = self.threshold - self.tier2_margin;
            let upper = self.threshold + self.tier2_margin;
            if signal.weight >= lower && signal.weight <= upper {
                if let Some(adjudicator) = &self.adjudicator {
                    let verdict = tokio::time::timeout(self.tier2_budget, adjudicator.adjudicate(signal)).await;
                    // On timeout, default to pass (spec §4.3 "On timeout, default to pass").
                    return match verdict {
                        Ok(true) | Err(_) => Verdict::Pass,
                        Ok(false) => Verdict::Drop,
                    };
                }
            }
        }

        Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{classify, Channel};

    #[tokio::test]
    async fn low_weight_noise_text_is_dropped() {
        let signal = classify("hi", Channel::Chat);
        let filter = NoiseFilter::new(0.6);
        assert_eq!(filter.filter(&signal).await, Verdict::Drop);
    }

    #[tokio::test]
    async fn high_weight_text_passes_even_if_it_looks_noisy() {
        // "hi" alone is noise, but a longer, substantive message is not
        // matched by the exact/prefix noise patterns.
        let signal = classify("hi, can you urgently investigate why the deploy is failing?", Channel::Chat);
        let filter = NoiseFilter::new(0.6);
        assert_eq!(filter.filter(&signal).await, Verdict::Pass);
    }

    #[tokio::test]
    async fn tier2_disabled_by_default_lets_borderline_weight_pass() {
        let signal = crate::signal::Signal {
            weight: 0.6,
            ..classify("some message", Channel::Chat)
        };
        let filter = NoiseFilter::default();
        assert!(!filter.tier2_enabled);
        assert_eq!(filter.filter(&signal).await, Verdict::Pass);
    }

    struct AlwaysDrop;
    #[async_trait]
    impl Adjudicator for AlwaysDrop {
        async fn adjudicate(&self, _signal: &Signal) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn tier2_adjudicator_can_drop_borderline_signal() {
        let signal = crate::signal::Signal {
            weight: 0.55,
            raw: "not an obvious noise pattern but borderline".to_string(),
            ..classify("placeholder", Channel::Chat)
        };
        let filter = NoiseFilter::new(0.6).with_tier2(std::sync::Arc::new(AlwaysDrop));
        assert_eq!(filter.filter(&signal).await, Verdict::Drop);
    }

    struct NeverResponds;
    #[async_trait]
    impl Adjudicator for NeverResponds {
        async fn adjudicate(&self, _signal: &Signal) -> bool {
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    #[tokio::test]
    async fn tier2_timeout_defaults_to_pass() {
        let signal = crate::signal::Signal {
            weight: 0.55,
            raw: "borderline message".to_string(),
            ..classify("placeholder", Channel::Chat)
        };
        let mut filter = NoiseFilter::new(0.6).with_tier2(std::sync::Arc::new(NeverResponds));
        filter.tier2_budget = std::time::Duration::from_millis(10);
        assert_eq!(filter.filter(&signal).await, Verdict::Pass);
    }
}
