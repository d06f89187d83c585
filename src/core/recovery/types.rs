//! Recovery action and plan types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::types::Severity;

/// The closed set of recovery actions the subsystem knows how to drive
///
/// Kept a closed enum so action handling stays exhaustive at compile time;
/// components opt into the kinds they support through
/// [`HealthCheck::apply_action`](crate::core::types::HealthCheck::apply_action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryActionKind {
    /// Write detailed diagnostics about the issue to the log
    LogDiagnostics,
    /// Ask the component to release reclaimable resources
    ForceGc,
    /// Re-issue the failed call
    RetryCall,
    /// Reset the component's provider connection and configuration
    ResetProvider,
    /// Reload the component's model or backing data from disk
    ReloadModel,
    /// Switch the component to its fallback backend
    SwitchFallback,
    /// Restart the component outright
    RestartComponent,
}

impl RecoveryActionKind {
    /// Risk associated with this action by default
    pub fn default_risk(&self) -> Severity {
        match self {
            RecoveryActionKind::LogDiagnostics
            | RecoveryActionKind::ForceGc
            | RecoveryActionKind::RetryCall => Severity::Low,
            RecoveryActionKind::ResetProvider
            | RecoveryActionKind::ReloadModel
            | RecoveryActionKind::SwitchFallback => Severity::Medium,
            RecoveryActionKind::RestartComponent => Severity::High,
        }
    }
}

impl std::fmt::Display for RecoveryActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecoveryActionKind::LogDiagnostics => "log_diagnostics",
            RecoveryActionKind::ForceGc => "force_gc",
            RecoveryActionKind::RetryCall => "retry_call",
            RecoveryActionKind::ResetProvider => "reset_provider",
            RecoveryActionKind::ReloadModel => "reload_model",
            RecoveryActionKind::SwitchFallback => "switch_fallback",
            RecoveryActionKind::RestartComponent => "restart_component",
        };
        f.write_str(s)
    }
}

/// One concrete remediation step targeting a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryAction {
    /// What to do
    pub kind: RecoveryActionKind,
    /// Risk of doing it
    pub risk: Severity,
    /// Component name the action targets
    pub target: String,
}

impl RecoveryAction {
    /// Create an action with the kind's default risk
    pub fn new(kind: RecoveryActionKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            risk: kind.default_risk(),
            target: target.into(),
        }
    }
}

/// Terminal and intermediate states of a recovery plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanOutcome {
    /// Not started (or skipped because the issue closed while queued)
    Pending,
    /// Actions are running
    Executing,
    /// The violated metric passed its threshold again
    Succeeded,
    /// All actions ran without clearing the violation
    Failed,
}

impl std::fmt::Display for PlanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanOutcome::Pending => "pending",
            PlanOutcome::Executing => "executing",
            PlanOutcome::Succeeded => "succeeded",
            PlanOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An ordered list of actions chosen to resolve one issue
///
/// Exclusively owned and mutated by the executor during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryPlan {
    /// Plan id
    pub id: Uuid,
    /// Issue this plan targets
    pub issue_id: Uuid,
    /// Component the issue belongs to
    pub component: String,
    /// Actions, in execution order
    pub actions: Vec<RecoveryAction>,
    /// Recovery attempts consumed for the issue, including this plan once
    /// it has run
    pub attempt_count: u32,
    /// Plan state
    pub outcome: PlanOutcome,
    /// Creation time
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RecoveryPlan {
    /// Create a pending plan for an issue
    pub fn new(issue_id: Uuid, component: impl Into<String>, actions: Vec<RecoveryAction>) -> Self {
        Self {
            id: Uuid::new_v4(),
            issue_id,
            component: component.into(),
            actions,
            attempt_count: 0,
            outcome: PlanOutcome::Pending,
            created_at: chrono::Utc::now(),
        }
    }
}
