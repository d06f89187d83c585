//! Event sink trait and shipped implementations

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

use super::types::{AuditEvent, EventKind};

/// Collaborator receiving audit events
///
/// Implemented by the host to forward events into its own log or memory
/// store. Errors are treated as "sink unavailable": the event is dropped
/// after a local warning.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Record one audit event
    async fn record_event(&self, event: AuditEvent) -> std::result::Result<(), String>;
}

/// Deliver an event to an optional sink, swallowing sink failures
pub(crate) async fn emit(
    sink: Option<&Arc<dyn EventSink>>,
    kind: EventKind,
    payload: serde_json::Value,
) {
    let Some(sink) = sink else { return };
    let event = AuditEvent::new(kind, payload);
    if let Err(reason) = sink.record_event(event).await {
        warn!(%kind, %reason, "Event sink rejected audit event");
    }
}

/// Sink that writes every event as a structured log line
#[derive(Debug, Default, Clone)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn record_event(&self, event: AuditEvent) -> std::result::Result<(), String> {
        info!(kind = %event.kind, payload = %event.payload, "Audit event");
        Ok(())
    }
}

/// Bounded in-memory sink
///
/// Keeps the most recent events in a ring buffer. Doubles as the audit-trail
/// hook for hosts with an in-process memory store and as the test double.
#[derive(Debug)]
pub struct MemoryEventSink {
    events: Mutex<VecDeque<AuditEvent>>,
    capacity: usize,
}

impl MemoryEventSink {
    /// Create a sink retaining at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
        }
    }

    /// Snapshot of retained events, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Retained events of one kind, oldest first
    pub fn events_of(&self, kind: EventKind) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events are retained
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Default for MemoryEventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn record_event(&self, event: AuditEvent) -> std::result::Result<(), String> {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }
}
