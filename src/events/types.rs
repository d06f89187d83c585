//! Audit event types

use serde::{Deserialize, Serialize};

/// Kind of audit event emitted by the subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new issue was opened for a threshold violation
    IssueOpened,
    /// An open issue was escalated to a higher severity
    IssueEscalated,
    /// An open issue was resolved
    IssueResolved,
    /// An issue exhausted its recovery attempts
    IssueFailed,
    /// One recovery action was executed
    RecoveryAttempt,
    /// A recovery plan reached a terminal outcome
    RecoveryCompleted,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::IssueOpened => "issue_opened",
            EventKind::IssueEscalated => "issue_escalated",
            EventKind::IssueResolved => "issue_resolved",
            EventKind::IssueFailed => "issue_failed",
            EventKind::RecoveryAttempt => "recovery_attempt",
            EventKind::RecoveryCompleted => "recovery_completed",
        };
        f.write_str(s)
    }
}

/// One audit trail entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// What happened
    pub kind: EventKind,
    /// When it happened
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Structured event detail (issue id, component, action, outcome)
    pub payload: serde_json::Value,
}

impl AuditEvent {
    /// Create an event stamped with the current time
    pub fn new(kind: EventKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: chrono::Utc::now(),
            payload,
        }
    }
}
