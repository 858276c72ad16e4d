//! In-process event bus and the canonical lifecycle event payloads.
//!
//! One schema, multiple handlers per event. Handlers run synchronously in
//! subscription order, so every event of batch *i* is delivered before
//! batch *i + 1* is prepared. A panicking handler is caught and logged; it
//! never corrupts the job.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BatchStart,
    Progress,
    Finish,
    Cancel,
    Stopped,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    /// Batches remain after this one.
    Processing,
    /// Every page has been handed to the host's print queue.
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishStatus {
    /// Completion of the final batch was actually observed.
    Done,
    /// The final batch was handed off; completion was assumed.
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    Single,
    Batched,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStartEvent {
    /// 1-based batch number.
    pub batch: usize,
    pub total_batches: usize,
    /// 1-based number of the first page in the batch.
    pub start_page: usize,
    pub pages_in_batch: usize,
    pub emitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Rounded integer percentage, non-decreasing, exactly 100 once.
    pub progress: u8,
    pub printed_pages: usize,
    pub total_pages: usize,
    pub current_batch: usize,
    pub total_batches: usize,
    pub status: ProgressStatus,
    pub emitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishEvent {
    pub status: FinishStatus,
    pub total_pages: usize,
    pub printed_pages: usize,
    pub total_batches: usize,
    pub mode: PrintMode,
    pub emitted_at: DateTime<Utc>,
}

/// Confirmation declined for a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelEvent {
    /// 1-based number of the batch whose gate was declined.
    pub batch: usize,
    pub emitted_at: DateTime<Utc>,
}

/// Cooperative stop observed at a batch boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedEvent {
    pub printed_pages: usize,
    pub total_pages: usize,
    pub current_batch: usize,
    pub emitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PrintEvent {
    BatchStart(BatchStartEvent),
    Progress(ProgressEvent),
    Finish(FinishEvent),
    Cancel(CancelEvent),
    Stopped(StoppedEvent),
    Error(ErrorEvent),
}

impl PrintEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PrintEvent::BatchStart(_) => EventKind::BatchStart,
            PrintEvent::Progress(_) => EventKind::Progress,
            PrintEvent::Finish(_) => EventKind::Finish,
            PrintEvent::Cancel(_) => EventKind::Cancel,
            PrintEvent::Stopped(_) => EventKind::Stopped,
            PrintEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Token returned by [`EventBus::on`], used to unsubscribe one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Handler = std::sync::Arc<dyn Fn(&PrintEvent) + Send + Sync>;

/// Multi-handler pub/sub keyed by [`EventKind`].
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler for one event kind.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&PrintEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.entry(kind).or_default().push((id, std::sync::Arc::new(handler)));
        id
    }

    /// Remove one subscription, or all subscriptions for the kind when `id`
    /// is `None`.
    pub fn off(&self, kind: EventKind, id: Option<SubscriptionId>) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        match (handlers.get_mut(&kind), id) {
            (Some(list), Some(id)) => list.retain(|(sid, _)| *sid != id),
            (Some(list), None) => list.clear(),
            (None, _) => {}
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        handlers.get(&kind).map(|list| list.len()).unwrap_or(0)
    }

    /// Deliver an event to every subscribed handler, in subscription order.
    /// Handler panics are caught and logged.
    pub fn emit(&self, event: PrintEvent) {
        let kind = event.kind();
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            handlers
                .get(&kind)
                .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::error!("event handler panicked while handling {:?}", kind);
            }
        }
    }
}
