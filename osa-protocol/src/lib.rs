//! OSA event protocol: the wire shape of one Event Bus event plus its SSE
//! resumption envelope (spec §3 `Event`, §6 "SSE stream").
//!
//! This crate has no dependency on `osa-core`; the Bus in `osa-core` produces
//! `OsaEvent`s and `osa-serve` wraps them with `SequenceState` before writing
//! newline-delimited JSON to subscribers.

pub mod envelope;
pub mod event;

pub use envelope::{DedupFilter, Envelope, SequenceState};
pub use event::OsaEvent;
