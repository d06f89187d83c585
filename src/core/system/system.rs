//! Self-healing system facade

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ConfigUpdate, HealingConfig};
use crate::core::diagnosis::{DiagnosisEngine, DiagnosisProvider};
use crate::core::issues::{Issue, IssueStatus, IssueTracker};
use crate::core::monitor::HealthMonitor;
use crate::core::recovery::{
    OutcomeHistory, PlanOutcome, RecoveryExecutor, RecoveryPlanner, RecoveryStats,
};
use crate::core::registry::ComponentRegistry;
use crate::core::types::{HealthCheck, Severity, Threshold};
use crate::events::EventSink;
use crate::utils::error::{HealingError, Result};

use super::report::{HealthReport, classify};

/// Shared handles threaded through each per-issue pipeline task
#[derive(Clone)]
struct PipelineDeps {
    config: Arc<RwLock<HealingConfig>>,
    tracker: Arc<IssueTracker>,
    diagnosis: Arc<DiagnosisEngine>,
    planner: Arc<RecoveryPlanner>,
    executor: Arc<RecoveryExecutor>,
}

/// Builder for [`SelfHealingSystem`]
#[derive(Default)]
pub struct SelfHealingSystemBuilder {
    config: HealingConfig,
    provider: Option<Arc<dyn DiagnosisProvider>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl SelfHealingSystemBuilder {
    /// Set the initial configuration
    pub fn config(mut self, config: HealingConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a diagnosis collaborator
    pub fn diagnosis_provider(mut self, provider: Arc<dyn DiagnosisProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Attach an audit event sink
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validate the configuration and assemble the system
    pub fn build(self) -> Result<SelfHealingSystem> {
        self.config.validate()?;

        let config = Arc::new(RwLock::new(self.config));
        let registry = Arc::new(ComponentRegistry::new());
        let tracker = Arc::new(IssueTracker::new(self.sink.clone()));
        let monitor = Arc::new(HealthMonitor::new(registry.clone(), tracker.clone()));
        let history = Arc::new(OutcomeHistory::new());
        let diagnosis = Arc::new(DiagnosisEngine::new(self.provider));
        let planner = Arc::new(RecoveryPlanner::new(history.clone()));
        let executor = Arc::new(RecoveryExecutor::new(
            registry.clone(),
            tracker.clone(),
            history.clone(),
            self.sink.clone(),
        ));

        Ok(SelfHealingSystem {
            config,
            registry,
            tracker,
            monitor,
            history,
            diagnosis,
            planner,
            executor,
            dispatch_task: Mutex::new(None),
            recovery_tasks: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

/// The self-healing monitoring and recovery subsystem
///
/// One explicitly owned instance per host, created through
/// [`SelfHealingSystem::builder`], started with
/// [`start`](SelfHealingSystem::start), and torn down with
/// [`stop`](SelfHealingSystem::stop) (graceful drain) or
/// [`hard_stop`](SelfHealingSystem::hard_stop).
pub struct SelfHealingSystem {
    config: Arc<RwLock<HealingConfig>>,
    registry: Arc<ComponentRegistry>,
    tracker: Arc<IssueTracker>,
    monitor: Arc<HealthMonitor>,
    history: Arc<OutcomeHistory>,
    diagnosis: Arc<DiagnosisEngine>,
    planner: Arc<RecoveryPlanner>,
    executor: Arc<RecoveryExecutor>,
    dispatch_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    recovery_tasks: Arc<Mutex<Vec<tokio::task::JoinHandle<()>>>>,
}

impl SelfHealingSystem {
    /// Create a system with the given configuration and no collaborators
    pub fn new(config: HealingConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Start building a system
    pub fn builder() -> SelfHealingSystemBuilder {
        SelfHealingSystemBuilder::default()
    }

    /// Register a component for monitoring
    ///
    /// Fails with [`HealingError::DuplicateComponent`] if the name is
    /// already registered.
    pub fn register_component(
        &self,
        name: impl Into<String>,
        check: Arc<dyn HealthCheck>,
        thresholds: Vec<Threshold>,
    ) -> Result<()> {
        self.registry.register(name, check, thresholds)
    }

    /// Remove a component, its live issues, and its recovery state
    ///
    /// Idempotent; an in-flight recovery plan for the component cancels at
    /// its next registry revalidation.
    pub fn unregister_component(&self, name: &str) -> bool {
        let removed = self.registry.unregister(name);
        if removed {
            self.tracker.clear_component(name);
            self.executor.forget_component(name);
        }
        removed
    }

    /// Start monitoring and recovery dispatch
    pub async fn start(&self) -> Result<()> {
        if self.monitor.is_running() {
            debug!("Self-healing system already started");
            return Ok(());
        }
        info!("Starting self-healing system");
        self.executor.set_draining(false);

        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Issue>>();
        self.monitor.start(self.config.clone(), tx);

        let deps = self.pipeline_deps();
        let recovery_tasks = self.recovery_tasks.clone();
        let dispatch = tokio::spawn(async move {
            while let Some(findings) = rx.recv().await {
                for issue in findings {
                    let handle = tokio::spawn(run_issue_pipeline(deps.clone(), issue));
                    let mut tasks = recovery_tasks.lock();
                    tasks.retain(|t| !t.is_finished());
                    tasks.push(handle);
                }
            }
            debug!("Recovery dispatch loop exited");
        });
        *self.dispatch_task.lock() = Some(dispatch);
        Ok(())
    }

    /// Stop monitoring with a graceful drain
    ///
    /// The monitor finishes its in-flight cycle, no new recovery plans are
    /// accepted, and already-executing recovery runs to completion.
    pub async fn stop(&self) {
        info!("Stopping self-healing system");
        self.executor.set_draining(true);
        self.monitor.stop().await;

        let dispatch = self.dispatch_task.lock().take();
        if let Some(dispatch) = dispatch {
            if let Err(e) = dispatch.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Recovery dispatch task ended abnormally");
                }
            }
        }
    }

    /// Stop immediately, aborting in-flight recovery
    pub async fn hard_stop(&self) {
        warn!("Hard-stopping self-healing system");
        self.executor.set_draining(true);
        self.monitor.abort();

        if let Some(dispatch) = self.dispatch_task.lock().take() {
            dispatch.abort();
        }
        let tasks: Vec<_> = std::mem::take(&mut *self.recovery_tasks.lock());
        for task in tasks {
            task.abort();
        }
    }

    /// Whether the monitoring loop is running
    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Run one monitoring cycle immediately and drive any resulting
    /// recovery to completion
    ///
    /// Useful for hosts that want an on-demand sweep in addition to the
    /// periodic loop, and for deterministic tests. Returns the violating
    /// issues the cycle found.
    pub async fn check_now(&self) -> Vec<Issue> {
        let check_timeout = self.config.read().action_timeout();
        let findings = self.monitor.run_cycle(check_timeout).await;

        let deps = self.pipeline_deps();
        let handles: Vec<_> = findings
            .iter()
            .map(|issue| tokio::spawn(run_issue_pipeline(deps.clone(), issue.clone())))
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Issue pipeline task panicked");
                }
            }
        }
        findings
    }

    /// Manually diagnose and recover one surfaced issue
    ///
    /// Bypasses the auto-recovery policy gate but honors every other
    /// invariant: per-component serialization and the per-issue attempt
    /// bound. An issue that already exhausted its attempts yields
    /// [`HealingError::RecoveryExhausted`].
    pub async fn handle_issue(&self, issue_id: Uuid) -> Result<PlanOutcome> {
        let issue = self
            .tracker
            .get(issue_id)
            .ok_or(HealingError::IssueNotFound(issue_id))?;
        if issue.status == IssueStatus::Failed {
            return Err(HealingError::RecoveryExhausted {
                issue: issue_id,
                attempts: issue.attempt_count,
            });
        }

        let config = self.config.read().clone();
        if issue.diagnosis.is_none() {
            let recent = self.tracker.recent(5);
            let text = self
                .diagnosis
                .diagnose(&issue, &recent, config.min_severity_for_recovery, config.action_timeout())
                .await;
            let _ = self.tracker.set_diagnosis(issue_id, text);
        }

        let issue = self
            .tracker
            .get(issue_id)
            .ok_or(HealingError::IssueNotFound(issue_id))?;
        let plan = self.planner.plan_manual(&issue);
        self.executor.execute(plan, &config).await
    }

    /// Current health report
    pub fn get_health_report(&self) -> HealthReport {
        let open_issues = self.tracker.snapshot();
        let monitoring_active = self.monitor.is_running();
        HealthReport {
            status: classify(&open_issues, monitoring_active),
            generated_at: chrono::Utc::now(),
            component_count: self.registry.len(),
            open_issues,
            last_check: self.tracker.last_ingest(),
            auto_recovery: self.config.read().auto_recovery,
            monitoring_active,
        }
    }

    /// Open issues, optionally filtered by minimum severity
    pub fn list_open_issues(&self, min_severity: Option<Severity>) -> Vec<Issue> {
        self.tracker.list_open(min_severity)
    }

    /// Per-(component, action) recovery outcome statistics
    pub fn recovery_stats(&self) -> RecoveryStats {
        self.history.stats()
    }

    /// Current configuration snapshot
    pub fn config(&self) -> HealingConfig {
        self.config.read().clone()
    }

    /// Apply a partial configuration update
    ///
    /// Takes effect immediately, except that a changed monitoring interval
    /// restarts the monitor loop when it is running.
    pub async fn set_config(&self, update: ConfigUpdate) -> Result<()> {
        let (merged, interval_changed) = {
            let current = self.config.read().clone();
            let merged = current.clone().merge(update);
            merged.validate()?;
            let changed = merged.monitoring_interval_secs != current.monitoring_interval_secs;
            (merged, changed)
        };
        *self.config.write() = merged;

        if interval_changed && self.monitor.is_running() {
            info!("Monitoring interval changed; restarting monitor loop");
            self.stop().await;
            self.start().await?;
        }
        Ok(())
    }

    fn pipeline_deps(&self) -> PipelineDeps {
        PipelineDeps {
            config: self.config.clone(),
            tracker: self.tracker.clone(),
            diagnosis: self.diagnosis.clone(),
            planner: self.planner.clone(),
            executor: self.executor.clone(),
        }
    }
}

/// Diagnose, plan, and execute recovery for one issue
///
/// Diagnosis is advisory: whatever it produces (collaborator answer or
/// templated fallback) is attached to the issue, and recovery proceeds
/// regardless. Policy gating happens in the planner; a gated issue simply
/// stays open for manual handling.
async fn run_issue_pipeline(deps: PipelineDeps, issue: Issue) {
    let config = deps.config.read().clone();

    let issue = if issue.severity >= config.min_severity_for_recovery {
        let _ = deps.tracker.set_status(issue.id, IssueStatus::Diagnosing);
        let recent = deps.tracker.recent(5);
        let text = deps
            .diagnosis
            .diagnose(
                &issue,
                &recent,
                config.min_severity_for_recovery,
                config.action_timeout(),
            )
            .await;
        let _ = deps.tracker.set_diagnosis(issue.id, text);
        let _ = deps.tracker.set_status(issue.id, IssueStatus::Open);

        // The issue may have resolved or escalated while diagnosing.
        match deps.tracker.get(issue.id) {
            Some(refreshed) => refreshed,
            None => return,
        }
    } else {
        issue
    };

    let Some(plan) = deps.planner.plan(&issue, &config) else {
        return;
    };

    match deps.executor.execute(plan, &config).await {
        Ok(outcome) => {
            debug!(issue_id = %issue.id, %outcome, "Recovery plan finished");
        }
        Err(e) if e.is_terminal() => {
            error!(issue_id = %issue.id, error = %e, "Recovery exhausted");
        }
        Err(HealingError::Shutdown(reason)) => {
            debug!(issue_id = %issue.id, %reason, "Recovery skipped during shutdown");
        }
        Err(e) => {
            warn!(issue_id = %issue.id, error = %e, "Recovery plan errored");
        }
    }
}
