//! Audit event sink
//!
//! Optional log/memory collaborator notified on issue lifecycle transitions
//! and on every recovery attempt. Sink failures are logged locally and never
//! affect subsystem behavior.

mod sink;
mod types;


pub use sink::{EventSink, MemoryEventSink, TracingEventSink};
pub use types::{AuditEvent, EventKind};

pub(crate) use sink::emit;
