//! Typed runtime settings: every configuration key enumerated in spec §6,
//! read from the process environment after [`crate::load_and_apply`] has run.

use std::env;

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_f64_opt(key: &str) -> Option<f64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Every knob spec §6 "Configuration (enumerated)" names, with the spec's defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct OsaSettings {
    pub max_context_tokens: u32,
    pub response_reserve_tokens: u32,
    pub noise_filter_threshold: f64,
    pub max_iterations: u32,
    pub max_agents: u32,
    pub tool_parallelism: u32,
    pub sub_agent_timeout_ms: u64,
    pub llm_timeout_ms: u64,
    pub daily_budget_usd: Option<f64>,
    pub monthly_budget_usd: Option<f64>,
    pub per_call_budget_usd: Option<f64>,
    pub default_provider: String,
    pub default_model: String,
    pub cache_control_enabled: bool,
    pub plan_mode_threshold: f64,
    /// Not in spec §6's enumerated list but required to gate the Open-Question
    /// Tier-2 noise filter (spec §4.3 / §10 "Open questions"); off by default.
    pub noise_filter_tier2_enabled: bool,
}

impl Default for OsaSettings {
    fn default() -> Self {
        Self {
            max_context_tokens: 128_000,
            response_reserve_tokens: 4_096,
            noise_filter_threshold: 0.6,
            max_iterations: 20,
            max_agents: 5,
            tool_parallelism: 5,
            sub_agent_timeout_ms: 300_000,
            llm_timeout_ms: 120_000,
            daily_budget_usd: None,
            monthly_budget_usd: None,
            per_call_budget_usd: None,
            default_provider: "mock".to_string(),
            default_model: "mock-model".to_string(),
            cache_control_enabled: true,
            plan_mode_threshold: 0.75,
            noise_filter_tier2_enabled: false,
        }
    }
}

impl OsaSettings {
    /// Reads every key from the process environment, falling back to spec defaults.
    /// Call [`crate::load_and_apply`] first to populate the environment from
    /// `.env` / XDG `config.toml` without clobbering anything already set.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_context_tokens: env_u32("OSA_MAX_CONTEXT_TOKENS", d.max_context_tokens),
            response_reserve_tokens: env_u32(
                "OSA_RESPONSE_RESERVE_TOKENS",
                d.response_reserve_tokens,
            ),
            noise_filter_threshold: env_f64(
                "OSA_NOISE_FILTER_THRESHOLD",
                d.noise_filter_threshold,
            ),
            max_iterations: env_u32("OSA_MAX_ITERATIONS", d.max_iterations),
            max_agents: env_u32("OSA_MAX_AGENTS", d.max_agents),
            tool_parallelism: env_u32("OSA_TOOL_PARALLELISM", d.tool_parallelism),
            sub_agent_timeout_ms: env_u32("OSA_SUB_AGENT_TIMEOUT_MS", d.sub_agent_timeout_ms as u32)
                as u64,
            llm_timeout_ms: env_u32("OSA_LLM_TIMEOUT_MS", d.llm_timeout_ms as u32) as u64,
            daily_budget_usd: env_f64_opt("OSA_DAILY_BUDGET_USD"),
            monthly_budget_usd: env_f64_opt("OSA_MONTHLY_BUDGET_USD"),
            per_call_budget_usd: env_f64_opt("OSA_PER_CALL_BUDGET_USD"),
            default_provider: env_string("OSA_DEFAULT_PROVIDER", &d.default_provider),
            default_model: env_string("OSA_DEFAULT_MODEL", &d.default_model),
            cache_control_enabled: env_bool("OSA_CACHE_CONTROL_ENABLED", d.cache_control_enabled),
            plan_mode_threshold: env_f64("OSA_PLAN_MODE_THRESHOLD", d.plan_mode_threshold),
            noise_filter_tier2_enabled: env_bool(
                "OSA_NOISE_FILTER_TIER2_ENABLED",
                d.noise_filter_tier2_enabled,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let s = OsaSettings::default();
        assert_eq!(s.max_context_tokens, 128_000);
        assert_eq!(s.response_reserve_tokens, 4_096);
        assert_eq!(s.noise_filter_threshold, 0.6);
        assert_eq!(s.max_iterations, 20);
        assert_eq!(s.max_agents, 5);
        assert_eq!(s.tool_parallelism, 5);
        assert_eq!(s.sub_agent_timeout_ms, 300_000);
        assert_eq!(s.llm_timeout_ms, 120_000);
        assert_eq!(s.plan_mode_threshold, 0.75);
    }

    #[test]
    fn from_env_overrides_default() {
        env::set_var("OSA_MAX_ITERATIONS", "7");
        let s = OsaSettings::from_env();
        env::remove_var("OSA_MAX_ITERATIONS");
        assert_eq!(s.max_iterations, 7);
    }
}
