//! Recovery executor

use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::HealingConfig;
use crate::core::issues::{Issue, IssueStatus, IssueTracker};
use crate::core::registry::{Component, ComponentRegistry};
use crate::core::types::CHECK_FAILURE_METRIC;
use crate::events::{EventKind, EventSink};
use crate::utils::error::{HealingError, Result};

use super::history::OutcomeHistory;
use super::types::{PlanOutcome, RecoveryAction, RecoveryActionKind, RecoveryPlan};

/// Executes recovery plans sequentially, one plan per component at a time
///
/// Per-plan state machine: `Pending → Executing → {Succeeded, Failed}`.
/// After every action the component's live health check is consulted; a
/// cleared violation is success regardless of transient action errors.
pub struct RecoveryExecutor {
    registry: Arc<ComponentRegistry>,
    tracker: Arc<IssueTracker>,
    history: Arc<OutcomeHistory>,
    sink: Option<Arc<dyn EventSink>>,
    /// Per-component execution locks enforcing single-flight recovery
    locks: DashMap<String, Arc<Mutex<()>>>,
    /// When set, no new plans are accepted (graceful drain)
    draining: AtomicBool,
}

impl RecoveryExecutor {
    /// Create an executor over the shared registry, tracker, and history
    pub fn new(
        registry: Arc<ComponentRegistry>,
        tracker: Arc<IssueTracker>,
        history: Arc<OutcomeHistory>,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        Self {
            registry,
            tracker,
            history,
            sink,
            locks: DashMap::new(),
            draining: AtomicBool::new(false),
        }
    }

    /// Refuse new plans (graceful drain); in-flight plans finish
    pub fn set_draining(&self, draining: bool) {
        self.draining.store(draining, Ordering::Release);
    }

    /// Whether new plans are currently refused
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Drop per-component state for an unregistered component
    pub fn forget_component(&self, component: &str) {
        self.locks.remove(component);
        self.history.clear_component(component);
    }

    /// Execute a plan to a terminal outcome
    ///
    /// Waits on the component's execution lock first: a plan for a
    /// component already under recovery queues here rather than running
    /// concurrently. Once the lock is held, the issue is re-validated in
    /// case it resolved (or its component was unregistered) while queued.
    ///
    /// Returns `Ok` with the plan outcome, or
    /// [`HealingError::RecoveryExhausted`] when this plan consumed the last
    /// allowed attempt.
    pub async fn execute(&self, mut plan: RecoveryPlan, config: &HealingConfig) -> Result<PlanOutcome> {
        if self.is_draining() {
            return Err(HealingError::Shutdown(format!(
                "refusing new recovery plan for component {}",
                plan.component
            )));
        }

        let lock = self
            .locks
            .entry(plan.component.clone())
            .or_default()
            .clone();
        let _guard = lock.lock().await;

        // Queued behind another plan: conditions may have changed.
        let Some(issue) = self.tracker.get(plan.issue_id) else {
            debug!(issue_id = %plan.issue_id, "Issue closed while plan was queued; skipping");
            return Ok(PlanOutcome::Pending);
        };
        if !issue.status.is_recoverable() {
            debug!(issue_id = %issue.id, status = %issue.status, "Issue no longer recoverable; skipping plan");
            return Ok(PlanOutcome::Pending);
        }

        let timeout = config.action_timeout();
        if self.tracker.set_status(issue.id, IssueStatus::Recovering).is_err() {
            return Ok(PlanOutcome::Pending);
        }
        plan.outcome = PlanOutcome::Executing;
        info!(
            issue_id = %issue.id,
            component = %plan.component,
            actions = plan.actions.len(),
            "Executing recovery plan"
        );

        for action in &plan.actions {
            let Some(component) = self.registry.get(&plan.component) else {
                debug!(component = %plan.component, "Component unregistered mid-plan; cancelling");
                return Ok(PlanOutcome::Pending);
            };

            let result = self.run_action(&component, action, &issue, timeout).await;
            let succeeded = result.is_ok();
            if succeeded {
                self.history.record_success(&plan.component, action.kind);
            } else {
                self.history.record_failure(&plan.component, action.kind);
            }
            if let Err(e) = &result {
                warn!(issue_id = %issue.id, action = %action.kind, error = %e, "Recovery action failed");
            }
            crate::events::emit(
                self.sink.as_ref(),
                EventKind::RecoveryAttempt,
                json!({
                    "issue_id": issue.id,
                    "component": plan.component,
                    "action": action.kind,
                    "success": succeeded,
                    "error": result.as_ref().err().map(ToString::to_string),
                }),
            )
            .await;

            // A cleared violation wins even when the action itself errored.
            if self.verify(&component, &issue, timeout).await {
                plan.outcome = PlanOutcome::Succeeded;
                // A concurrent cycle may have resolved the issue already.
                if let Err(e) = self
                    .tracker
                    .resolve(issue.id, &format!("recovered by {}", action.kind))
                    .await
                {
                    debug!(issue_id = %issue.id, error = %e, "Issue already closed at resolution");
                }
                crate::events::emit(
                    self.sink.as_ref(),
                    EventKind::RecoveryCompleted,
                    json!({
                        "issue_id": issue.id,
                        "component": plan.component,
                        "outcome": "succeeded",
                        "action": action.kind,
                    }),
                )
                .await;
                info!(issue_id = %issue.id, action = %action.kind, "Recovery succeeded");
                return Ok(PlanOutcome::Succeeded);
            }
        }

        // Plan exhausted without clearing the violation. The issue may
        // have been closed by a concurrent cycle; that closes the matter.
        let attempts = match self.tracker.record_attempt(plan.issue_id) {
            Ok(attempts) => attempts,
            Err(_) => {
                debug!(issue_id = %plan.issue_id, "Issue closed mid-plan");
                return Ok(PlanOutcome::Pending);
            }
        };
        plan.attempt_count = attempts;
        plan.outcome = PlanOutcome::Failed;
        crate::events::emit(
            self.sink.as_ref(),
            EventKind::RecoveryCompleted,
            json!({
                "issue_id": issue.id,
                "component": plan.component,
                "outcome": "failed",
                "attempts": attempts,
            }),
        )
        .await;

        if attempts >= config.max_attempts_per_issue {
            if self.tracker.mark_failed(plan.issue_id).await.is_err() {
                return Ok(PlanOutcome::Pending);
            }
            return Err(HealingError::RecoveryExhausted {
                issue: plan.issue_id,
                attempts,
            });
        }

        // Back to open: the next monitoring cycle plans afresh.
        let _ = self.tracker.set_status(plan.issue_id, IssueStatus::Open);
        warn!(
            issue_id = %issue.id,
            attempts,
            remaining = config.max_attempts_per_issue - attempts,
            "Recovery plan failed; will replan"
        );
        Ok(PlanOutcome::Failed)
    }

    /// Run one action with a bounded timeout
    async fn run_action(
        &self,
        component: &Arc<Component>,
        action: &RecoveryAction,
        issue: &Issue,
        timeout: Duration,
    ) -> Result<()> {
        debug!(component = %component.name, action = %action.kind, risk = %action.risk, "Running recovery action");

        // log_diagnostics is handled by the executor itself; everything
        // else is delegated to the component's capability.
        if action.kind == RecoveryActionKind::LogDiagnostics {
            info!(
                issue_id = %issue.id,
                component = %issue.component,
                metric = %issue.metric_name,
                severity = %issue.severity,
                attempts = issue.attempt_count,
                description = %issue.description,
                diagnosis = issue.diagnosis.as_deref().unwrap_or("none"),
                "Issue diagnostics"
            );
            return Ok(());
        }

        match tokio::time::timeout(timeout, component.check.apply_action(action.kind)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(HealingError::RecoveryActionError {
                action: action.kind.to_string(),
                reason,
            }),
            Err(_) => Err(HealingError::RecoveryActionError {
                action: action.kind.to_string(),
                reason: format!("timed out after {timeout:?}"),
            }),
        }
    }

    /// Re-check the component and decide whether the issue's violation
    /// cleared
    async fn verify(&self, component: &Arc<Component>, issue: &Issue, timeout: Duration) -> bool {
        let metrics = match tokio::time::timeout(timeout, component.check.check()).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(reason)) => {
                debug!(component = %component.name, %reason, "Verification check failed");
                return false;
            }
            Err(_) => {
                debug!(component = %component.name, "Verification check timed out");
                return false;
            }
        };

        // For a check-failure issue, a completed check is the recovery.
        if issue.metric_name == CHECK_FAILURE_METRIC {
            return true;
        }

        let Some(metric) = metrics.iter().find(|m| m.name == issue.metric_name) else {
            // Metric absent: the violation cannot be confirmed cleared.
            return false;
        };

        let thresholds = component.thresholds_for(&issue.metric_name);
        if thresholds.is_empty() {
            metric.healthy
        } else {
            !thresholds.iter().any(|t| t.violated(&metric.value))
        }
    }
}
