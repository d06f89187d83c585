//! Issue representation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::types::Severity;

/// Issue lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Violation is live and no recovery is in flight
    Open,
    /// An advisory diagnosis is being requested
    Diagnosing,
    /// A recovery plan is executing for this issue
    Recovering,
    /// The violation cleared
    Resolved,
    /// Recovery attempts are exhausted; needs manual attention
    Failed,
}

impl IssueStatus {
    /// Whether the issue is still live (not terminal-resolved)
    pub fn is_live(&self) -> bool {
        !matches!(self, IssueStatus::Resolved)
    }

    /// Whether recovery may still be planned for this issue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IssueStatus::Open | IssueStatus::Diagnosing)
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueStatus::Open => "open",
            IssueStatus::Diagnosing => "diagnosing",
            IssueStatus::Recovering => "recovering",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A tracked, deduplicated health violation
///
/// At most one live issue exists per (component, metric) pair; repeated
/// violations update the existing record in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Stable issue id
    pub id: Uuid,
    /// Component the violation belongs to
    pub component: String,
    /// Metric that violated its threshold
    pub metric_name: String,
    /// Current severity; never decreases within one open lifecycle
    pub severity: Severity,
    /// Violation description, refreshed on every re-observation
    pub description: String,
    /// Advisory diagnosis annotation, if one was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    /// When the issue was opened
    pub opened_at: chrono::DateTime<chrono::Utc>,
    /// When the violation was last observed
    pub last_seen: chrono::DateTime<chrono::Utc>,
    /// Lifecycle state
    pub status: IssueStatus,
    /// Recovery attempts consumed so far
    pub attempt_count: u32,
}

impl Issue {
    /// Open a new issue for a violation observed now
    pub fn open(
        component: impl Into<String>,
        metric_name: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            component: component.into(),
            metric_name: metric_name.into(),
            severity,
            description: description.into(),
            diagnosis: None,
            opened_at: now,
            last_seen: now,
            status: IssueStatus::Open,
            attempt_count: 0,
        }
    }

    /// Dedup key for this issue
    pub fn key(&self) -> (String, String) {
        (self.component.clone(), self.metric_name.clone())
    }
}
