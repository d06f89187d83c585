//! Shared test fakes and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use selfheal_rs::{
    DiagnosisProvider, HealingConfig, HealingError, HealthCheck, HealthMetric,
    RecoveryActionKind, Severity, Threshold,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Config with short timeouts suitable for tests
pub fn fast_config(auto_recovery: bool) -> HealingConfig {
    HealingConfig {
        auto_recovery,
        min_severity_for_recovery: Severity::Medium,
        monitoring_interval_secs: 1,
        max_attempts_per_issue: 3,
        action_timeout_ms: 250,
    }
}

/// A single `hit_rate >= 0.5` threshold at the given severity
pub fn hit_rate_min(severity: Severity) -> Vec<Threshold> {
    vec![Threshold::min("hit_rate", 0.5, severity)]
}

/// Health check that replays scripted metric batches, repeating the last
/// one once the script is exhausted
pub struct ScriptedCheck {
    script: Mutex<VecDeque<Vec<HealthMetric>>>,
    last: Mutex<Vec<HealthMetric>>,
}

impl ScriptedCheck {
    pub fn new(batches: Vec<Vec<HealthMetric>>) -> Self {
        Self {
            script: Mutex::new(batches.into_iter().collect()),
            last: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl HealthCheck for ScriptedCheck {
    async fn check(&self) -> Result<Vec<HealthMetric>, String> {
        if let Some(batch) = self.script.lock().pop_front() {
            *self.last.lock() = batch.clone();
            Ok(batch)
        } else {
            Ok(self.last.lock().clone())
        }
    }
}

/// What fixes a [`BrokenComponent`]
#[derive(Clone, Copy, PartialEq)]
pub enum FixPolicy {
    /// Nothing does
    Never,
    /// Any recovery action does
    Any,
    /// Only the given action does
    On(RecoveryActionKind),
}

/// Component reporting `hit_rate` 0.1 until fixed, 0.9 after
///
/// Tracks how many `apply_action` calls ran concurrently, for asserting
/// the single-flight-per-component invariant.
pub struct BrokenComponent {
    healthy: AtomicBool,
    fix: FixPolicy,
    delay: Option<Duration>,
    barrier: Option<Arc<tokio::sync::Barrier>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    applied: AtomicUsize,
}

impl BrokenComponent {
    pub fn new(fix: FixPolicy) -> Self {
        Self {
            healthy: AtomicBool::new(false),
            fix,
            delay: None,
            barrier: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            applied: AtomicUsize::new(0),
        }
    }

    /// Rendezvous with other components before an action takes effect
    pub fn with_barrier(mut self, barrier: Arc<tokio::sync::Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// Sleep inside every action before it takes effect
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    /// Highest number of actions observed executing at once
    pub fn max_concurrent_actions(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Total actions applied
    pub fn actions_applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthCheck for BrokenComponent {
    async fn check(&self) -> Result<Vec<HealthMetric>, String> {
        let rate = if self.is_healthy() { 0.9 } else { 0.1 };
        Ok(vec![HealthMetric::new("hit_rate", rate)])
    }

    async fn apply_action(&self, action: RecoveryActionKind) -> Result<(), String> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.applied.fetch_add(1, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match self.fix {
            FixPolicy::Any => {
                self.healthy.store(true, Ordering::SeqCst);
                Ok(())
            }
            FixPolicy::On(kind) if kind == action => {
                self.healthy.store(true, Ordering::SeqCst);
                Ok(())
            }
            _ => Err("action had no effect".to_string()),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Component whose check reports two independent metrics, both violating
pub struct DoublyBroken {
    inner: BrokenComponent,
}

impl DoublyBroken {
    pub fn new() -> Self {
        Self {
            inner: BrokenComponent::new(FixPolicy::Never),
        }
    }

    pub fn max_concurrent_actions(&self) -> usize {
        self.inner.max_concurrent_actions()
    }
}

#[async_trait]
impl HealthCheck for DoublyBroken {
    async fn check(&self) -> Result<Vec<HealthMetric>, String> {
        Ok(vec![
            HealthMetric::new("read_latency_ms", 900.0),
            HealthMetric::new("write_latency_ms", 900.0),
        ])
    }

    async fn apply_action(&self, action: RecoveryActionKind) -> Result<(), String> {
        self.inner.apply_action(action).await
    }
}

/// Diagnosis collaborator that fails on every call
pub struct FailingDiagnosis {
    pub calls: AtomicUsize,
}

impl FailingDiagnosis {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DiagnosisProvider for FailingDiagnosis {
    async fn generate_diagnosis(&self, _prompt: &str) -> selfheal_rs::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HealingError::Diagnosis("model overloaded".to_string()))
    }
}
