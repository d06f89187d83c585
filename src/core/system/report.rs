//! Health report types

use serde::{Deserialize, Serialize};

use crate::core::issues::Issue;
use crate::core::types::Severity;

/// Overall subsystem status, derived from the live issue set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    /// No live issues
    Healthy,
    /// Live issues below High severity
    Warning,
    /// At least one High issue
    Degraded,
    /// At least one Critical issue
    Critical,
    /// Monitoring is stopped
    Inactive,
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SystemStatus::Healthy => "healthy",
            SystemStatus::Warning => "warning",
            SystemStatus::Degraded => "degraded",
            SystemStatus::Critical => "critical",
            SystemStatus::Inactive => "inactive",
        };
        f.write_str(s)
    }
}

/// Snapshot of subsystem health handed to the host
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Derived overall status
    pub status: SystemStatus,
    /// When the report was generated
    pub generated_at: chrono::DateTime<chrono::Utc>,
    /// Number of registered components
    pub component_count: usize,
    /// Live issues, failed ones included
    pub open_issues: Vec<Issue>,
    /// Time of the most recent monitoring ingest
    pub last_check: Option<chrono::DateTime<chrono::Utc>>,
    /// Whether automatic recovery is enabled
    pub auto_recovery: bool,
    /// Whether the monitoring loop is running
    pub monitoring_active: bool,
}

/// Classify overall status from the live issue set
pub(super) fn classify(issues: &[Issue], monitoring_active: bool) -> SystemStatus {
    if !monitoring_active {
        return SystemStatus::Inactive;
    }
    let worst = issues.iter().map(|i| i.severity).max();
    match worst {
        None => SystemStatus::Healthy,
        Some(Severity::Critical) => SystemStatus::Critical,
        Some(Severity::High) => SystemStatus::Degraded,
        Some(_) => SystemStatus::Warning,
    }
}
