//! Event Bus (spec §4.1): compiled, type-tagged in-process dispatch from
//! producers to many handlers, plus a `Subscribe(topic)` surface for
//! external consumers (SSE in `osa-serve`).
//!
//! Two independent fan-out mechanisms share one `Emit`:
//! - **Handlers** (`on`/`off`): run in-process, in isolated tasks so a
//!   panicking or slow handler never blocks the emitter or other handlers.
//! - **Subscribers** (`subscribe`): bounded per-subscriber queues for
//!   external consumption, matched against `firehose` / `session:<id>` /
//!   `type:<T>` topics, with drop-oldest backpressure.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use osa_protocol::OsaEvent;
use tokio::sync::Notify;

pub type HandlerId = u64;
pub type SubscriberId = u64;

/// A handler invoked for every event of a given kind (or every event, for
/// `"*"`). Boxed so handlers can close over arbitrary state.
pub type HandlerFn = Arc<dyn Fn(OsaEvent) -> futures::future::BoxFuture<'static, ()> + Send + Sync>;

struct HandlerEntry {
    event_kind: String,
    handler: HandlerFn,
}

/// A topic an external subscriber listens on (spec §4.1 "three topic
/// families").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Topic {
    Firehose,
    Session(String),
    Type(String),
}

impl Topic {
    fn matches(&self, event: &OsaEvent) -> bool {
        match self {
            Topic::Firehose => true,
            Topic::Session(id) => event.session_id() == id,
            Topic::Type(kind) => event.kind() == kind,
        }
    }
}

/// Drop-oldest bounded queue backing one subscriber. A plain `mpsc` channel
/// drops the *newest* item on overflow (`try_send` fails); spec §4.1 requires
/// dropping the oldest instead, so subscribers get a small deque behind a
/// lock plus a `Notify` to wake a waiting receiver.
struct SubscriberQueue {
    topic: Topic,
    queue: std::sync::Mutex<VecDeque<OsaEvent>>,
    capacity: usize,
    notify: Notify,
    dropped: AtomicU64,
}

impl SubscriberQueue {
    fn push(&self, event: OsaEvent) -> Option<u64> {
        let mut queue = self.queue.lock().unwrap();
        let mut just_dropped = None;
        if queue.len() >= self.capacity {
            queue.pop_front();
            let total = self.dropped.fetch_add(1, Ordering::SeqCst) + 1;
            just_dropped = Some(total);
        }
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
        just_dropped
    }

    async fn recv(&self) -> OsaEvent {
        loop {
            {
                let mut queue = self.queue.lock().unwrap();
                if let Some(event) = queue.pop_front() {
                    return event;
                }
            }
            self.notify.notified().await;
        }
    }
}

/// A subscriber's receive handle.
pub struct Subscription {
    id: SubscriberId,
    queue: Arc<SubscriberQueue>,
    bus: Bus,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub async fn recv(&self) -> OsaEvent {
        self.queue.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.subscribers.remove(&self.id);
    }
}

/// The Event Bus. Cheap to clone: all state lives behind `Arc`/`DashMap`.
#[derive(Clone, Default)]
pub struct Bus {
    handlers: Arc<DashMap<HandlerId, HandlerEntry>>,
    subscribers: Arc<DashMap<SubscriberId, Arc<SubscriberQueue>>>,
    next_handler_id: Arc<AtomicU64>,
    next_subscriber_id: Arc<AtomicU64>,
    default_backlog: usize,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            default_backlog: 256,
            ..Default::default()
        }
    }

    /// Registers `handler` to run for every event whose `kind()` equals
    /// `event_kind`, or every event when `event_kind` is `"*"`.
    pub fn on(&self, event_kind: impl Into<String>, handler: HandlerFn) -> HandlerId {
        let id = self.next_handler_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.insert(
            id,
            HandlerEntry {
                event_kind: event_kind.into(),
                handler,
            },
        );
        id
    }

    pub fn off(&self, id: HandlerId) {
        self.handlers.remove(&id);
    }

    /// Subscribes to `topic` with a bounded backlog; drop-oldest on overflow,
    /// with a `system_event{event: backlog_dropped}` emitted back onto the
    /// bus so operators can see it (spec §4.1 "Failure").
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.subscribe_with_backlog(topic, self.default_backlog)
    }

    pub fn subscribe_with_backlog(&self, topic: Topic, backlog: usize) -> Subscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        let queue = Arc::new(SubscriberQueue {
            topic,
            queue: std::sync::Mutex::new(VecDeque::new()),
            capacity: backlog.max(1),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
        });
        self.subscribers.insert(id, queue.clone());
        Subscription {
            id,
            queue,
            bus: self.clone(),
        }
    }

    /// Fire-and-forget emit: fans out to matching handlers (each in its own
    /// task, in registration order) and matching subscriber queues. Never
    /// blocks the caller.
    pub fn emit(&self, event: OsaEvent) {
        for entry in self.handlers.iter() {
            if entry.event_kind == "*" || entry.event_kind == event.kind() {
                let handler = entry.handler.clone();
                let event = event.clone();
                tokio::spawn(async move {
                    handler(event).await;
                });
            }
        }

        let mut backlog_events = Vec::new();
        for subscriber in self.subscribers.iter() {
            if subscriber.topic.matches(&event) {
                if let Some(dropped_count) = subscriber.push(event.clone()) {
                    backlog_events.push((subscriber.key().to_string(), dropped_count));
                }
            }
        }
        for (subscriber_id, dropped_count) in backlog_events {
            self.emit(OsaEvent::system(
                event.session_id(),
                "backlog_dropped",
                serde_json::json!({"subscriber_id": subscriber_id, "dropped_count": dropped_count}),
            ));
        }
    }
}
