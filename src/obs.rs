//! Observability event broker
//!
//! The orchestrator publishes one [`Event`] per stage of the loop; the
//! broker fans events out to subscribers over bounded queues. Delivery is
//! best-effort: a subscriber whose queue is full misses that event, other
//! subscribers are unaffected, and the publisher never blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Per-subscriber queue capacity. Once full, further events are dropped
/// for that subscriber only.
pub const SUBSCRIBER_BUFFER: usize = 64;

/// Kind of an observability event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A plan was produced (initial or replan)
    Plan,
    /// A step-execution reply was processed
    Step,
    /// An approved command was executed
    Command,
    /// A free-chat exchange happened
    Chat,
}

/// One record published for operator observation
///
/// Field population depends on the kind; empty optional fields are omitted
/// from the JSON encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_prompt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plan_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reply: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub artifact_id: String,
}

impl Event {
    /// Event of the given kind with all payload fields empty
    pub fn new(kind: EventKind, session_id: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            kind,
            session_id: session_id.into(),
            prompt: String::new(),
            model_prompt: String::new(),
            plan_text: String::new(),
            step_id: String::new(),
            step_title: String::new(),
            command: String::new(),
            raw_output: String::new(),
            reply: String::new(),
            note: String::new(),
            artifact_id: String::new(),
        }
    }
}

/// Publish/subscribe fan-out with non-blocking delivery
///
/// Safe under concurrent publish/subscribe/unsubscribe. Event publication
/// order is preserved per publisher; drops mean there is no total order
/// across subscribers.
#[derive(Default)]
pub struct Broker {
    subs: Mutex<HashMap<u64, mpsc::Sender<Event>>>,
    next_id: AtomicU64,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the event with the current wall clock and deliver it to every
    /// subscriber without blocking.
    pub fn publish(&self, mut event: Event) {
        event.timestamp = Some(Utc::now());
        let subs = self.subs.lock().unwrap();
        for tx in subs.values() {
            let _ = tx.try_send(event.clone());
        }
    }

    /// Register a subscriber; the returned handle unsubscribes on drop.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subs.lock().unwrap().insert(id, tx);
        Subscription {
            id,
            rx,
            broker: Arc::clone(self),
        }
    }

    /// Remove a subscriber, closing its channel. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: u64) {
        self.subs.lock().unwrap().remove(&id);
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subs.lock().unwrap().len()
    }
}

/// A live subscription to the broker
///
/// Dropping the subscription removes it from the broker's subscriber set.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Event>,
    broker: Arc<Broker>,
}

impl Subscription {
    /// Await the next event; `None` after the subscription is closed.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for draining in tests.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broker.unsubscribe(self.id);
    }
}
