//! Recovery planner

use std::sync::Arc;
use tracing::debug;

use crate::config::HealingConfig;
use crate::core::issues::Issue;
use crate::core::types::Severity;

use super::history::OutcomeHistory;
use super::types::{RecoveryAction, RecoveryActionKind, RecoveryPlan};

/// Base action classes per issue severity, mildest remediation first
fn action_classes(severity: Severity) -> &'static [RecoveryActionKind] {
    use RecoveryActionKind::*;
    match severity {
        Severity::Low => &[LogDiagnostics],
        Severity::Medium => &[LogDiagnostics, ForceGc, RetryCall],
        Severity::High => &[RetryCall, ResetProvider, ReloadModel],
        Severity::Critical => &[SwitchFallback, RestartComponent],
    }
}

/// Builds recovery plans from the static severity mapping and the
/// per-component outcome history
pub struct RecoveryPlanner {
    history: Arc<OutcomeHistory>,
}

impl RecoveryPlanner {
    /// Create a planner over a shared outcome history
    pub fn new(history: Arc<OutcomeHistory>) -> Self {
        Self { history }
    }

    /// Plan recovery for an issue under the current policy
    ///
    /// Returns `None` when auto-recovery is disabled or the issue is below
    /// the configured severity floor; the issue then stays open for manual
    /// handling.
    pub fn plan(&self, issue: &Issue, config: &HealingConfig) -> Option<RecoveryPlan> {
        if !config.auto_recovery {
            debug!(issue_id = %issue.id, "Auto-recovery disabled; leaving issue for manual handling");
            return None;
        }
        if issue.severity < config.min_severity_for_recovery {
            debug!(
                issue_id = %issue.id,
                severity = %issue.severity,
                floor = %config.min_severity_for_recovery,
                "Issue below recovery severity floor"
            );
            return None;
        }
        Some(self.build(issue))
    }

    /// Plan recovery for a manually handled issue, ignoring the
    /// auto-recovery policy gate
    pub fn plan_manual(&self, issue: &Issue) -> RecoveryPlan {
        self.build(issue)
    }

    fn build(&self, issue: &Issue) -> RecoveryPlan {
        let component = issue.component.as_str();
        let mut kinds: Vec<RecoveryActionKind> = action_classes(issue.severity).to_vec();

        // Promote what has worked for this component, demote what keeps
        // failing. The sort is stable, so ties keep the class order; a
        // demoted action moves behind alternatives but is never dropped.
        kinds.sort_by_key(|kind| {
            (
                self.history.is_demoted(component, *kind),
                -self.history.score(component, *kind),
            )
        });

        let actions = kinds
            .into_iter()
            .map(|kind| RecoveryAction::new(kind, component))
            .collect();

        let mut plan = RecoveryPlan::new(issue.id, component, actions);
        plan.attempt_count = issue.attempt_count;
        plan
    }
}
