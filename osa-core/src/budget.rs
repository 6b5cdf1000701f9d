//! Per-session and per-call cost budget enforcement (spec §6 `daily_budget_usd` /
//! `per_call_budget_usd`).
//!
//! `BudgetLedger` tracks USD spend derived from `ProviderUsage` token counts at a
//! configured per-token rate. The ReAct loop checks `check_call` before each
//! `think` and records spend with `record` after the provider responds.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::provider::ProviderUsage;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BudgetError {
    #[error("per-call budget of ${limit:.4} would be exceeded by a ${cost:.4} call")]
    PerCallExceeded { limit: f64, cost: f64 },

    #[error("daily budget of ${limit:.4} exhausted (${spent:.4} spent)")]
    DailyExceeded { limit: f64, spent: f64 },
}

/// USD-per-token pricing for one model, used to convert `ProviderUsage` into cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenRate {
    pub prompt_usd_per_1k: f64,
    pub completion_usd_per_1k: f64,
}

impl TokenRate {
    pub fn cost(&self, usage: &ProviderUsage) -> f64 {
        let prompt = usage.prompt_tokens.saturating_sub(usage.cached_tokens) as f64;
        prompt / 1000.0 * self.prompt_usd_per_1k
            + usage.completion_tokens as f64 / 1000.0 * self.completion_usd_per_1k
    }
}

/// Tracks cumulative spend for one process lifetime (approximates "daily" —
/// callers that need calendar-day rollover reset the ledger on a timer).
/// Spend is stored as micro-dollars (`* 1_000_000`) in an `AtomicU64` so
/// `check_call`/`record` never need a lock.
pub struct BudgetLedger {
    daily_budget_usd: Option<f64>,
    per_call_budget_usd: Option<f64>,
    spent_micros: AtomicU64,
}

impl BudgetLedger {
    pub fn new(daily_budget_usd: Option<f64>, per_call_budget_usd: Option<f64>) -> Self {
        Self {
            daily_budget_usd,
            per_call_budget_usd,
            spent_micros: AtomicU64::new(0),
        }
    }

    pub fn spent_usd(&self) -> f64 {
        self.spent_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    /// Checks whether a call estimated to cost `estimated_cost` fits within
    /// both the per-call cap and the remaining daily budget.
    pub fn check_call(&self, estimated_cost: f64) -> Result<(), BudgetError> {
        if let Some(limit) = self.per_call_budget_usd {
            if estimated_cost > limit {
                return Err(BudgetError::PerCallExceeded {
                    limit,
                    cost: estimated_cost,
                });
            }
        }
        if let Some(limit) = self.daily_budget_usd {
            let spent = self.spent_usd();
            if spent + estimated_cost > limit {
                return Err(BudgetError::DailyExceeded { limit, spent });
            }
        }
        Ok(())
    }

    /// Records actual spend after a call completes.
    pub fn record(&self, cost_usd: f64) {
        let micros = (cost_usd.max(0.0) * 1_000_000.0).round() as u64;
        self.spent_micros.fetch_add(micros, Ordering::Relaxed);
    }
}
