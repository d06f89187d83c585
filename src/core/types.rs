//! Shared domain types for health monitoring
//!
//! These types cross every layer of the subsystem: components produce
//! [`HealthMetric`]s, the registry owns [`Threshold`]s, and the tracker
//! classifies violations by [`Severity`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::recovery::RecoveryActionKind;

/// Name of the synthetic metric emitted when a health check itself fails
pub const CHECK_FAILURE_METRIC: &str = "check_failure";

/// Ordered issue severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no urgency
    Low,
    /// Default severity for threshold violations
    #[default]
    Medium,
    /// Degrades the host noticeably
    High,
    /// The component is effectively down
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A single observed metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Numeric observation (rates, counts, latencies)
    Number(f64),
    /// Boolean observation (reachability, validity)
    Flag(bool),
}

impl MetricValue {
    /// Numeric view of the value, if it is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            MetricValue::Flag(_) => None,
        }
    }

    /// Boolean view of the value, if it is one
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            MetricValue::Flag(v) => Some(*v),
            MetricValue::Number(_) => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Flag(v)
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(v) => write!(f, "{v}"),
            MetricValue::Flag(v) => write!(f, "{v}"),
        }
    }
}

/// A single named health observation produced by a component check
///
/// Immutable once created; each monitoring cycle produces fresh metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetric {
    /// Metric name, unique within one check result
    pub name: String,
    /// Observed value
    pub value: MetricValue,
    /// When the observation was taken
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// The producer's own health verdict for this observation
    pub healthy: bool,
    /// Optional free-form detail (failure reason, unit, context)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthMetric {
    /// Create a healthy metric with the current timestamp
    pub fn new(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            timestamp: chrono::Utc::now(),
            healthy: true,
            detail: None,
        }
    }

    /// Create a metric the producer already considers unhealthy
    pub fn unhealthy(name: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            healthy: false,
            ..Self::new(name, value)
        }
    }

    /// Attach a free-form detail string
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Synthetic metric for a check that errored, timed out, or panicked
    pub fn check_failure(reason: impl Into<String>) -> Self {
        Self::unhealthy(CHECK_FAILURE_METRIC, false).with_detail(reason)
    }
}

/// Boundary condition and severity assigned to one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threshold {
    /// Metric name this threshold applies to
    pub metric_name: String,
    /// Lower bound for numeric metrics
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper bound for numeric metrics
    #[serde(default)]
    pub max: Option<f64>,
    /// Expected value for boolean metrics
    #[serde(default)]
    pub expected: Option<bool>,
    /// Severity of an issue opened when the threshold is violated
    #[serde(default)]
    pub severity: Severity,
}

impl Threshold {
    /// Threshold requiring `metric >= min`
    pub fn min(metric_name: impl Into<String>, min: f64, severity: Severity) -> Self {
        Self {
            metric_name: metric_name.into(),
            min: Some(min),
            max: None,
            expected: None,
            severity,
        }
    }

    /// Threshold requiring `metric <= max`
    pub fn max(metric_name: impl Into<String>, max: f64, severity: Severity) -> Self {
        Self {
            metric_name: metric_name.into(),
            min: None,
            max: Some(max),
            expected: None,
            severity,
        }
    }

    /// Threshold requiring a boolean metric to equal `expected`
    pub fn expect(metric_name: impl Into<String>, expected: bool, severity: Severity) -> Self {
        Self {
            metric_name: metric_name.into(),
            min: None,
            max: None,
            expected: Some(expected),
            severity,
        }
    }

    /// Whether the given value violates this threshold
    pub fn violated(&self, value: &MetricValue) -> bool {
        match value {
            MetricValue::Number(v) => {
                self.min.is_some_and(|m| *v < m) || self.max.is_some_and(|m| *v > m)
            }
            // A boolean metric with no explicit expectation is expected true.
            MetricValue::Flag(v) => *v != self.expected.unwrap_or(true),
        }
    }

    /// Human-readable description of a violation of this threshold
    pub fn describe_violation(&self, value: &MetricValue) -> String {
        match value {
            MetricValue::Number(v) if self.min.is_some_and(|m| *v < m) => format!(
                "metric {} below minimum: value={v} (min {})",
                self.metric_name,
                self.min.unwrap_or_default()
            ),
            MetricValue::Number(v) => format!(
                "metric {} above maximum: value={v} (max {})",
                self.metric_name,
                self.max.unwrap_or_default()
            ),
            MetricValue::Flag(v) => {
                format!("metric {} check failed: value={v}", self.metric_name)
            }
        }
    }
}

/// Index thresholds by the metric name they reference
///
/// Several thresholds may target the same metric (warning and critical
/// bands); the tracker picks the most severe violated one.
pub fn thresholds_by_metric(thresholds: &[Threshold]) -> BTreeMap<String, Vec<Threshold>> {
    let mut map: BTreeMap<String, Vec<Threshold>> = BTreeMap::new();
    for t in thresholds {
        map.entry(t.metric_name.clone()).or_default().push(t.clone());
    }
    map
}

/// Capability interface implemented by monitored components
///
/// `check` is the only required method. Components that can act on recovery
/// instructions additionally override `apply_action`; the default rejects
/// every action so purely passive components stay a one-method impl.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Sample the component's health
    ///
    /// An `Err` is turned into a synthetic [`HealthMetric::check_failure`]
    /// by the monitor; it never aborts the monitoring cycle.
    async fn check(&self) -> std::result::Result<Vec<HealthMetric>, String>;

    /// Apply one recovery action to the component
    async fn apply_action(&self, action: RecoveryActionKind) -> std::result::Result<(), String> {
        Err(format!("recovery action {action} not supported"))
    }
}
