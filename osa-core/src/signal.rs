//! Signal Classifier (spec §4.2): a pure, deterministic, sub-millisecond
//! classification of an inbound message into a `Signal` 5-tuple, by ordered
//! trigger-table pattern matching. No I/O, no LLM call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Build,
    Execute,
    Analyze,
    Maintain,
    Assist,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Direct,
    Inform,
    Commit,
    Decide,
    Express,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Question,
    Issue,
    Scheduling,
    Summary,
    General,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Command,
    Message,
    Notification,
    Document,
}

/// The channel a message arrived on, used only to derive `Format` (spec §4.2
/// "Format: derived solely from channel").
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Cli,
    Chat,
    Webhook,
    File,
}

/// Immutable classification record. Once emitted, never mutated (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Signal {
    pub mode: Mode,
    pub genre: Genre,
    #[serde(rename = "type")]
    pub kind: SignalType,
    pub format: Format,
    pub weight: f64,
    pub raw: String,
    pub channel: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered trigger tables. Enumerable and testable (spec §4.2 "All trigger
/// tables are configuration"); kept as plain `&[&str]` slices rather than an
/// external config file so `Classify` stays a pure function with no I/O.
struct TriggerTables;

impl TriggerTables {
    const BUILD: &'static [&'static str] = &["build", "implement", "create", "add feature", "write code"];
    const EXECUTE: &'static [&'static str] = &["run", "execute", "deploy", "start", "launch"];
    const ANALYZE: &'static [&'static str] = &["analyze", "investigate", "debug", "why does", "explain"];
    const MAINTAIN: &'static [&'static str] = &["fix", "update", "refactor", "clean up", "maintain"];

    const DIRECTIVE: &'static [&'static str] = &["please", "could you", "can you"];
    const COMMISSIVE: &'static [&'static str] = &["i will", "i'll", "we will", "we'll"];
    const DECLARATIVE: &'static [&'static str] = &["approve", "reject", "decide", "decided"];
    const EXPRESSIVE: &'static [&'static str] = &["thanks", "thank you", "great job", "appreciate"];

    const ISSUE: &'static [&'static str] = &["error", "bug", "crash", "fails", "broken", "exception"];
    const SCHEDULING: &'static [&'static str] = &["tomorrow", "next week", "at 3pm", "schedule", "deadline", "by friday"];
    const SUMMARY: &'static [&'static str] = &["summarize", "brief", "recap", "tl;dr"];

    const URGENCY: &'static [&'static str] = &["urgent", "asap", "immediately", "critical", "now"];
    const NOISE: &'static [&'static str] = &["hi", "hello", "hey", "thanks", "ok", "okay", "lol", "ack"];
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn imperative_opening(text: &str) -> bool {
    const VERBS: &[&str] = &["run", "add", "fix", "write", "create", "update", "remove", "check", "build", "make"];
    text.split_whitespace()
        .next()
        .map(|w| VERBS.contains(&w))
        .unwrap_or(false)
}

fn classify_mode(lower: &str) -> Mode {
    if contains_any(lower, TriggerTables::BUILD) {
        Mode::Build
    } else if contains_any(lower, TriggerTables::EXECUTE) {
        Mode::Execute
    } else if contains_any(lower, TriggerTables::ANALYZE) {
        Mode::Analyze
    } else if contains_any(lower, TriggerTables::MAINTAIN) {
        Mode::Maintain
    } else {
        Mode::Assist
    }
}

fn classify_genre(lower: &str) -> Genre {
    if imperative_opening(lower) || contains_any(lower, TriggerTables::DIRECTIVE) {
        Genre::Direct
    } else if contains_any(lower, TriggerTables::COMMISSIVE) {
        Genre::Commit
    } else if contains_any(lower, TriggerTables::DECLARATIVE) {
        Genre::Decide
    } else if contains_any(lower, TriggerTables::EXPRESSIVE) {
        Genre::Express
    } else {
        Genre::Inform
    }
}

fn classify_type(raw: &str, lower: &str) -> SignalType {
    if raw.contains('?') || lower.starts_with("what") || lower.starts_with("why") || lower.starts_with("how") {
        SignalType::Question
    } else if contains_any(lower, TriggerTables::ISSUE) {
        SignalType::Issue
    } else if contains_any(lower, TriggerTables::SCHEDULING) {
        SignalType::Scheduling
    } else if contains_any(lower, TriggerTables::SUMMARY) {
        SignalType::Summary
    } else {
        SignalType::General
    }
}

fn classify_format(channel: Channel) -> Format {
    match channel {
        Channel::Cli => Format::Command,
        Channel::Chat => Format::Message,
        Channel::Webhook => Format::Notification,
        Channel::File => Format::Document,
    }
}

/// Sub-linear length bonus: diminishing returns, capped at +0.2 (spec §4.2
/// "add up to +0.2 proportional to a sub-linear length function").
fn length_bonus(raw: &str) -> f64 {
    let len = raw.chars().count() as f64;
    let normalized = (len.ln_1p() / 200f64.ln_1p()).min(1.0);
    normalized * 0.2
}

fn classify_weight(raw: &str, lower: &str, kind: SignalType) -> f64 {
    let mut weight = 0.5 + length_bonus(raw);
    if kind == SignalType::Question {
        weight += 0.15;
    }
    if contains_any(lower, TriggerTables::URGENCY) {
        weight += 0.2;
    }
    if contains_any(lower, TriggerTables::NOISE) {
        weight -= 0.3;
    }
    weight.clamp(0.0, 1.0)
}

/// `Classify(raw_text, channel) -> Signal`.
pub fn classify(raw_text: &str, channel: Channel) -> Signal {
    let lower = raw_text.to_lowercase();
    let kind = classify_type(raw_text, &lower);
    Signal {
        mode: classify_mode(&lower),
        genre: classify_genre(&lower),
        kind,
        format: classify_format(channel),
        weight: classify_weight(raw_text, &lower, kind),
        raw: raw_text.to_string(),
        channel: format!("{channel:?}"),
        timestamp: Utc::now(),
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Channel::Cli => "cli",
            Channel::Chat => "chat",
            Channel::Webhook => "webhook",
            Channel::File => "file",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_trigger_wins_over_analyze() {
        let s = classify("build and analyze the new service", Channel::Chat);
        assert_eq!(s.mode, Mode::Build);
    }

    #[test]
    fn question_mark_sets_question_type_and_weight_bonus() {
        let s = classify("why is this failing?", Channel::Chat);
        assert_eq!(s.kind, SignalType::Question);
    }

    #[test]
    fn urgency_lexicon_increases_weight() {
        let calm = classify("please review this when you can", Channel::Chat);
        let urgent = classify("please review this urgently asap", Channel::Chat);
        assert!(urgent.weight > calm.weight);
    }

    #[test]
    fn noise_lexicon_decreases_weight() {
        let s = classify("hey thanks", Channel::Chat);
        assert!(s.weight < 0.5);
    }

    #[test]
    fn weight_is_always_clamped() {
        let s = classify("hi", Channel::Chat);
        assert!(s.weight >= 0.0 && s.weight <= 1.0);
    }

    #[test]
    fn format_is_derived_from_channel() {
        assert_eq!(classify("x", Channel::Cli).format, Format::Command);
        assert_eq!(classify("x", Channel::Webhook).format, Format::Notification);
        assert_eq!(classify("x", Channel::File).format, Format::Document);
    }

    #[test]
    fn default_mode_is_assist_without_triggers() {
        let s = classify("just chatting about the weather", Channel::Chat);
        assert_eq!(s.mode, Mode::Assist);
    }

    #[test]
    fn classify_is_deterministic() {
        let a = classify("fix the crash in build", Channel::Chat);
        let b = classify("fix the crash in build", Channel::Chat);
        assert_eq!(a.mode, b.mode);
        assert_eq!(a.genre, b.genre);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.format, b.format);
        assert_eq!(a.weight, b.weight);
    }
}
