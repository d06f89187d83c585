//! Health monitor implementation

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::HealingConfig;
use crate::core::issues::{Issue, IssueTracker};
use crate::core::registry::{Component, ComponentRegistry};
use crate::core::types::HealthMetric;
use crate::utils::error::HealingError;

/// Runs the periodic sampling loop over the component registry
///
/// State machine: `Stopped → Running → Stopped`. Shutdown is cooperative:
/// [`stop`](HealthMonitor::stop) wakes the loop and waits for an in-flight
/// cycle to finish rather than interrupting a callback mid-flight.
pub struct HealthMonitor {
    registry: Arc<ComponentRegistry>,
    tracker: Arc<IssueTracker>,
    active: AtomicBool,
    /// Shutdown signal for the currently running loop, fresh per start
    shutdown: Mutex<Option<Arc<Notify>>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl HealthMonitor {
    /// Create a monitor over the shared registry and tracker
    pub fn new(registry: Arc<ComponentRegistry>, tracker: Arc<IssueTracker>) -> Self {
        Self {
            registry,
            tracker,
            active: AtomicBool::new(false),
            shutdown: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Whether the periodic loop is running
    #[inline]
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Start the periodic monitoring loop
    ///
    /// Each cycle's violating issues are sent through `findings_tx` for
    /// recovery dispatch. Starting an already-running monitor is a no-op.
    pub fn start(
        self: &Arc<Self>,
        config: Arc<RwLock<HealingConfig>>,
        findings_tx: mpsc::UnboundedSender<Vec<Issue>>,
    ) {
        if self.active.swap(true, Ordering::AcqRel) {
            debug!("Health monitor already running");
            return;
        }

        let interval = config.read().monitoring_interval();
        info!(?interval, "Starting health monitor");

        let shutdown = Arc::new(Notify::new());
        *self.shutdown.lock() = Some(shutdown.clone());

        let monitor = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.notified() => break,
                }
                if !monitor.is_running() {
                    break;
                }

                let check_timeout = config.read().action_timeout();
                let findings = monitor.run_cycle(check_timeout).await;
                if !findings.is_empty() && findings_tx.send(findings).is_err() {
                    error!("Recovery dispatch channel closed; stopping monitor loop");
                    break;
                }
            }
            monitor.active.store(false, Ordering::Release);
            debug!("Health monitor loop exited");
        });

        *self.task.lock() = Some(task);
    }

    /// Stop the periodic loop, letting an in-flight cycle finish
    pub async fn stop(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        info!("Stopping health monitor");
        // notify_one stores a permit, so the wakeup is not lost when the
        // loop is mid-cycle rather than parked on the select.
        if let Some(shutdown) = self.shutdown.lock().take() {
            shutdown.notify_one();
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Health monitor task ended abnormally");
                }
            }
        }
    }

    /// Abort the loop without waiting for the current cycle
    pub fn abort(&self) {
        self.active.store(false, Ordering::Release);
        self.shutdown.lock().take();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Run one full monitoring cycle and return the violating issues that
    /// are eligible for recovery planning
    ///
    /// Checks run concurrently, each in its own task bounded by
    /// `check_timeout`; a check that errors, hangs, or panics yields a
    /// synthetic check-failure metric against that component alone.
    pub async fn run_cycle(&self, check_timeout: Duration) -> Vec<Issue> {
        let components = self.registry.list();
        if components.is_empty() {
            return Vec::new();
        }
        debug!(components = components.len(), "Running monitoring cycle");

        let checks = components
            .into_iter()
            .map(|component| sample_component(component, check_timeout));
        let sampled = futures::future::join_all(checks).await;

        // Metrics for a component are always ingested before recovery can
        // be planned from this cycle's findings.
        let mut findings = Vec::new();
        for (component, metrics) in sampled {
            let issues = self
                .tracker
                .ingest(&component.name, &metrics, component.thresholds())
                .await;
            findings.extend(issues);
        }
        findings
    }
}

/// Invoke one component's check with panic and timeout isolation
async fn sample_component(
    component: Arc<Component>,
    check_timeout: Duration,
) -> (Arc<Component>, Vec<HealthMetric>) {
    let check = component.check.clone();
    let mut handle = tokio::spawn(async move { check.check().await });

    let metrics = match tokio::time::timeout(check_timeout, &mut handle).await {
        Ok(Ok(Ok(metrics))) => metrics,
        Ok(Ok(Err(reason))) => {
            warn!(
                "{}",
                HealingError::CallbackError {
                    component: component.name.clone(),
                    reason: reason.clone(),
                }
            );
            vec![HealthMetric::check_failure(reason)]
        }
        Ok(Err(join_error)) => {
            warn!(
                "{}",
                HealingError::CallbackError {
                    component: component.name.clone(),
                    reason: format!("health check panicked: {join_error}"),
                }
            );
            vec![HealthMetric::check_failure(format!(
                "health check panicked: {join_error}"
            ))]
        }
        Err(_) => {
            handle.abort();
            vec![HealthMetric::check_failure(format!(
                "health check timed out after {check_timeout:?}"
            ))]
        }
    };

    (component, metrics)
}
