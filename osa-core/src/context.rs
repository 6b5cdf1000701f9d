//! Context Assembler (spec §4.4): builds the system prompt the Provider sees,
//! as a Static Base (cached at boot, reloaded only on command) plus a
//! token-budgeted Dynamic Context built fresh per request.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::signal::Signal;

/// Whether a `SystemBlock` may be cached by a provider's cache-control
/// contract (spec §4.4 "Output contract").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheHint {
    Cacheable,
    Volatile,
}

#[derive(Clone, Debug)]
pub struct SystemBlock {
    pub text: String,
    pub cache_hint: CacheHint,
}

/// Rendered, boot-time system prompt body. Byte-identical across calls
/// between reloads (spec §4.4 invariant).
#[derive(Clone, Debug)]
pub struct StaticBase {
    pub text: String,
    pub token_count: u32,
    pub loaded_at: DateTime<Utc>,
    pub interpolated_keys: Vec<String>,
}

impl StaticBase {
    /// Interpolates `{{key}}` placeholders in `template` from `vars`, in the
    /// order `vars` lists them, and estimates the token count.
    pub fn render(template: &str, vars: &[(&str, &str)]) -> Self {
        let mut text = template.to_string();
        let mut interpolated_keys = Vec::new();
        for (key, value) in vars {
            let placeholder = format!("{{{{{key}}}}}");
            if text.contains(&placeholder) {
                text = text.replace(&placeholder, value);
                interpolated_keys.push((*key).to_string());
            }
        }
        Self {
            token_count: estimate_tokens(&text),
            text,
            loaded_at: Utc::now(),
            interpolated_keys,
        }
    }
}

/// Process-wide cache for the Static Base; write-once per reload (spec §5
/// "Static Base is write-once per reload (copy-on-write)").
#[derive(Default)]
pub struct StaticBaseCache {
    inner: RwLock<Option<StaticBase>>,
}

impl StaticBaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<StaticBase> {
        self.inner.read().unwrap().clone()
    }

    /// Explicit reload; replaces the cached base atomically.
    pub fn reload(&self, base: StaticBase) {
        *self.inner.write().unwrap() = Some(base);
    }
}

/// One piece of the Dynamic Context, tagged with its priority tier. Tier 1
/// is never truncated; Tiers 2-4 are dropped lowest-first when the budget is
/// tight (spec §4.4 "truncating the lowest tier first").
#[derive(Clone, Debug)]
pub struct DynamicBlock {
    pub tier: u8,
    pub text: String,
}

impl DynamicBlock {
    pub fn tier1(text: impl Into<String>) -> Self {
        Self { tier: 1, text: text.into() }
    }
    pub fn tier2(text: impl Into<String>) -> Self {
        Self { tier: 2, text: text.into() }
    }
    pub fn tier3(text: impl Into<String>) -> Self {
        Self { tier: 3, text: text.into() }
    }
    pub fn tier4(text: impl Into<String>) -> Self {
        Self { tier: 4, text: text.into() }
    }
}

/// Rough token estimate (chars / 4) used before an exact tokenizer is wired
/// in by the channel adapter; the Context Assembler only needs a consistent,
/// monotonic proxy for budget math.
pub fn estimate_tokens(text: &str) -> u32 {
    ((text.chars().count() as f64) / 4.0).ceil() as u32
}

pub struct AssembleRequest<'a> {
    pub signal: &'a Signal,
    pub session_id: &'a str,
    pub channel: &'a str,
    pub plan_mode_block: Option<String>,
    pub environment_block: String,
    pub tier2_blocks: Vec<String>,
    pub tier3_blocks: Vec<String>,
    pub tier4_blocks: Vec<String>,
    pub max_context_tokens: u32,
    pub response_reserve_tokens: u32,
    pub conversation_tokens: u32,
}

const TRUNCATED_MARKER: &str = "\n…truncated…";

/// Assembles the Static Base plus a token-budgeted Dynamic Context into the
/// ordered list of `SystemBlock`s a Provider call sends.
pub fn assemble(static_base: &StaticBase, request: &AssembleRequest<'_>) -> Vec<SystemBlock> {
    let budget = request
        .max_context_tokens
        .saturating_sub(request.response_reserve_tokens)
        .saturating_sub(request.conversation_tokens)
        .saturating_sub(static_base.token_count);

    let mut blocks = vec![DynamicBlock::tier1(format!(
        "signal: mode={:?} genre={:?} type={:?} weight={:.2}\nsession: {}\nchannel: {}\ntimestamp: {}",
        request.signal.mode,
        request.signal.genre,
        request.signal.kind,
        request.signal.weight,
        request.session_id,
        request.channel,
        Utc::now().to_rfc3339(),
    ))];
    if let Some(plan) = &request.plan_mode_block {
        blocks.push(DynamicBlock::tier1(plan.clone()));
    }
    blocks.push(DynamicBlock::tier1(request.environment_block.clone()));
    blocks.extend(request.tier2_blocks.iter().cloned().map(DynamicBlock::tier2));
    blocks.extend(request.tier3_blocks.iter().cloned().map(DynamicBlock::tier3));
    blocks.extend(request.tier4_blocks.iter().cloned().map(DynamicBlock::tier4));

    let dynamic_text = fit_to_budget(blocks, budget);

    vec![
        SystemBlock {
            text: static_base.text.clone(),
            cache_hint: CacheHint::Cacheable,
        },
        SystemBlock {
            text: dynamic_text,
            cache_hint: CacheHint::Volatile,
        },
    ]
}

/// Drops whole blocks from the lowest tier upward until the remainder fits
/// `budget` tokens, then joins what's left. Tier 1 blocks are never dropped,
/// even if that means exceeding `budget` — callers size `response_reserve`
/// and `conversation_tokens` so this stays rare.
fn fit_to_budget(mut blocks: Vec<DynamicBlock>, budget: u32) -> String {
    let mut truncated = false;
    loop {
        let total: u32 = blocks.iter().map(|b| estimate_tokens(&b.text)).sum();
        if total <= budget {
            break;
        }
        let lowest_tier = blocks.iter().map(|b| b.tier).max();
        match lowest_tier {
            Some(tier) if tier > 1 => {
                if let Some(pos) = blocks.iter().rposition(|b| b.tier == tier) {
                    blocks.remove(pos);
                    truncated = true;
                }
            }
            _ => break,
        }
    }
    let mut text = blocks
        .into_iter()
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("\n\n");
    if truncated {
        text.push_str(TRUNCATED_MARKER);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{classify, Channel};

    fn request<'a>(signal: &'a Signal) -> AssembleRequest<'a> {
        AssembleRequest {
            signal,
            session_id: "s1",
            channel: "chat",
            plan_mode_block: None,
            environment_block: "cwd: /repo\nos: linux".to_string(),
            tier2_blocks: vec!["tools: search, read_file".to_string()],
            tier3_blocks: vec!["profile: likes terse answers".to_string()],
            tier4_blocks: vec!["addendum: macOS keychain note".to_string()],
            max_context_tokens: 1000,
            response_reserve_tokens: 100,
            conversation_tokens: 50,
        }
    }

    #[test]
    fn static_base_render_interpolates_placeholders() {
        let base = StaticBase::render("Hello {{name}}, rules: {{rules}}", &[("name", "Agent"), ("rules", "be terse")]);
        assert_eq!(base.text, "Hello Agent, rules: be terse");
        assert_eq!(base.interpolated_keys, vec!["name".to_string(), "rules".to_string()]);
    }

    #[test]
    fn static_base_cache_reload_replaces_value() {
        let cache = StaticBaseCache::new();
        assert!(cache.get().is_none());
        cache.reload(StaticBase::render("v1", &[]));
        assert_eq!(cache.get().unwrap().text, "v1");
        cache.reload(StaticBase::render("v2", &[]));
        assert_eq!(cache.get().unwrap().text, "v2");
    }

    #[test]
    fn assemble_returns_cacheable_static_then_volatile_dynamic() {
        let signal = classify("hello", Channel::Chat);
        let base = StaticBase::render("system rules", &[]);
        let blocks = assemble(&base, &request(&signal));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].cache_hint, CacheHint::Cacheable);
        assert_eq!(blocks[1].cache_hint, CacheHint::Volatile);
        assert_eq!(blocks[0].text, "system rules");
    }

    #[test]
    fn assemble_drops_lowest_tier_first_under_tight_budget() {
        let signal = classify("hello", Channel::Chat);
        let base = StaticBase::render("system rules", &[]);
        let mut req = request(&signal);
        req.max_context_tokens = 40;
        req.response_reserve_tokens = 0;
        req.conversation_tokens = 0;
        let blocks = assemble(&base, &req);
        let dynamic = &blocks[1].text;
        assert!(!dynamic.contains("macOS keychain"));
        assert!(dynamic.contains(TRUNCATED_MARKER.trim()));
    }

    #[test]
    fn assemble_never_drops_tier1_signal_overlay() {
        let signal = classify("hello", Channel::Chat);
        let base = StaticBase::render("system rules", &[]);
        let mut req = request(&signal);
        req.max_context_tokens = 1;
        req.response_reserve_tokens = 0;
        req.conversation_tokens = 0;
        let blocks = assemble(&base, &req);
        assert!(blocks[1].text.contains("signal: mode="));
    }
}
