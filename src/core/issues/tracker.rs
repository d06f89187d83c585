//! Issue tracker implementation

use parking_lot::RwLock;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::types::{
    CHECK_FAILURE_METRIC, HealthMetric, Severity, Threshold,
};
use crate::events::{EventKind, EventSink};
use crate::utils::error::{HealingError, Result};

use super::types::{Issue, IssueStatus};

/// Resolved and failed issues retained for history-aware diagnosis
const RECENT_CAP: usize = 100;

#[derive(Default)]
struct TrackerState {
    /// Live issues keyed by (component, metric)
    live: HashMap<(String, String), Issue>,
    /// Reverse index from issue id to dedup key
    by_id: HashMap<Uuid, (String, String)>,
    /// Recently closed issues, oldest first
    recent: VecDeque<Issue>,
    /// Threshold misconfigurations already warned about
    warned: HashSet<(String, String)>,
    /// Time of the last ingest, any component
    last_ingest: Option<chrono::DateTime<chrono::Utc>>,
}

/// Tracks open issues and their lifecycle
///
/// All issue mutation goes through this API; issues handed out are clones.
pub struct IssueTracker {
    state: RwLock<TrackerState>,
    sink: Option<Arc<dyn EventSink>>,
}

impl IssueTracker {
    /// Create a tracker, optionally wired to an audit event sink
    pub fn new(sink: Option<Arc<dyn EventSink>>) -> Self {
        Self {
            state: RwLock::new(TrackerState::default()),
            sink,
        }
    }

    /// Ingest one component's metrics for a monitoring cycle
    ///
    /// Violating metrics open or update issues per the dedup invariant;
    /// passing metrics resolve any live issue for their (component, metric)
    /// pair. Returns the violating issues still eligible for recovery
    /// planning (status `Open`).
    pub async fn ingest(
        &self,
        component: &str,
        metrics: &[HealthMetric],
        thresholds: &std::collections::BTreeMap<String, Vec<Threshold>>,
    ) -> Vec<Issue> {
        let now = chrono::Utc::now();
        let mut events: Vec<(EventKind, serde_json::Value)> = Vec::new();
        let mut actionable = Vec::new();

        {
            let mut state = self.state.write();
            state.last_ingest = Some(now);

            let produced: HashSet<&str> = metrics.iter().map(|m| m.name.as_str()).collect();
            let check_failed = produced.contains(CHECK_FAILURE_METRIC);

            // A threshold naming a metric the check never produces is a
            // misconfiguration: warned once, never fatal. Skipped when the
            // check itself failed, since nothing was produced at all.
            if !check_failed {
                for metric_name in thresholds.keys() {
                    if !produced.contains(metric_name.as_str()) {
                        let key = (component.to_string(), metric_name.clone());
                        if state.warned.insert(key) {
                            warn!(
                                "{}",
                                HealingError::ThresholdMisconfiguration {
                                    component: component.to_string(),
                                    metric: metric_name.clone(),
                                }
                            );
                        }
                    }
                }
            }

            for metric in metrics {
                let verdict = classify(metric, thresholds);
                let key = (component.to_string(), metric.name.clone());

                match verdict {
                    Some((severity, description)) => {
                        if let Some(issue) = state.live.get_mut(&key) {
                            issue.last_seen = now;
                            issue.description = description;
                            if severity > issue.severity {
                                info!(
                                    component,
                                    metric = %metric.name,
                                    from = %issue.severity,
                                    to = %severity,
                                    "Escalating issue severity"
                                );
                                issue.severity = severity;
                                events.push((
                                    EventKind::IssueEscalated,
                                    json!({
                                        "issue_id": issue.id,
                                        "component": component,
                                        "metric": metric.name,
                                        "severity": severity,
                                    }),
                                ));
                            }
                            if issue.status == IssueStatus::Open {
                                actionable.push(issue.clone());
                            }
                        } else {
                            let issue =
                                Issue::open(component, &metric.name, severity, description);
                            warn!(
                                component,
                                metric = %metric.name,
                                %severity,
                                description = %issue.description,
                                "Issue detected"
                            );
                            events.push((
                                EventKind::IssueOpened,
                                json!({
                                    "issue_id": issue.id,
                                    "component": component,
                                    "metric": metric.name,
                                    "severity": severity,
                                    "description": issue.description,
                                }),
                            ));
                            state.by_id.insert(issue.id, key.clone());
                            actionable.push(issue.clone());
                            state.live.insert(key, issue);
                        }
                    }
                    None => {
                        if state.live.contains_key(&key) {
                            Self::resolve_locked(
                                &mut state,
                                &key,
                                "violation cleared by healthy observation",
                                &mut events,
                            );
                        }
                    }
                }
            }
        }

        self.flush_events(events).await;
        actionable
    }

    /// Resolve an issue by id
    ///
    /// Used by the recovery executor once post-action verification passes.
    pub async fn resolve(&self, id: Uuid, reason: &str) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut state = self.state.write();
            let key = state
                .by_id
                .get(&id)
                .cloned()
                .ok_or(HealingError::IssueNotFound(id))?;
            Self::resolve_locked(&mut state, &key, reason, &mut events);
        }
        self.flush_events(events).await;
        Ok(())
    }

    /// Mark an issue failed after recovery exhaustion
    ///
    /// The issue stays visible in the tracker (and the health report) until
    /// its violation clears or its component is unregistered.
    pub async fn mark_failed(&self, id: Uuid) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut state = self.state.write();
            let key = state
                .by_id
                .get(&id)
                .cloned()
                .ok_or(HealingError::IssueNotFound(id))?;
            if let Some(issue) = state.live.get_mut(&key) {
                issue.status = IssueStatus::Failed;
                warn!(
                    component = %issue.component,
                    metric = %issue.metric_name,
                    attempts = issue.attempt_count,
                    "Issue marked failed; needs manual attention"
                );
                events.push((
                    EventKind::IssueFailed,
                    json!({
                        "issue_id": id,
                        "component": issue.component,
                        "metric": issue.metric_name,
                        "attempts": issue.attempt_count,
                    }),
                ));
            }
        }
        self.flush_events(events).await;
        Ok(())
    }

    /// Consume one recovery attempt for an issue, returning the new count
    pub fn record_attempt(&self, id: Uuid) -> Result<u32> {
        let mut state = self.state.write();
        let key = state
            .by_id
            .get(&id)
            .cloned()
            .ok_or(HealingError::IssueNotFound(id))?;
        let issue = state
            .live
            .get_mut(&key)
            .ok_or(HealingError::IssueNotFound(id))?;
        issue.attempt_count = issue.attempt_count.saturating_add(1);
        Ok(issue.attempt_count)
    }

    /// Set the lifecycle status of an issue
    pub fn set_status(&self, id: Uuid, status: IssueStatus) -> Result<()> {
        let mut state = self.state.write();
        let key = state
            .by_id
            .get(&id)
            .cloned()
            .ok_or(HealingError::IssueNotFound(id))?;
        if let Some(issue) = state.live.get_mut(&key) {
            debug!(issue_id = %id, from = %issue.status, to = %status, "Issue status transition");
            issue.status = status;
        }
        Ok(())
    }

    /// Attach an advisory diagnosis annotation to an issue
    pub fn set_diagnosis(&self, id: Uuid, diagnosis: impl Into<String>) -> Result<()> {
        let mut state = self.state.write();
        let key = state
            .by_id
            .get(&id)
            .cloned()
            .ok_or(HealingError::IssueNotFound(id))?;
        if let Some(issue) = state.live.get_mut(&key) {
            issue.diagnosis = Some(diagnosis.into());
        }
        Ok(())
    }

    /// Look up a live issue by id
    pub fn get(&self, id: Uuid) -> Option<Issue> {
        let state = self.state.read();
        let key = state.by_id.get(&id)?;
        state.live.get(key).cloned()
    }

    /// Open issues, optionally filtered by minimum severity
    ///
    /// Failed issues are excluded here; they appear in [`Self::snapshot`]
    /// so reports can surface them.
    pub fn list_open(&self, min_severity: Option<Severity>) -> Vec<Issue> {
        let state = self.state.read();
        let mut issues: Vec<_> = state
            .live
            .values()
            .filter(|i| i.status.is_live() && i.status != IssueStatus::Failed)
            .filter(|i| min_severity.is_none_or(|min| i.severity >= min))
            .cloned()
            .collect();
        issues.sort_by_key(|i| i.opened_at);
        issues
    }

    /// All live issues, failed ones included
    pub fn snapshot(&self) -> Vec<Issue> {
        let state = self.state.read();
        let mut issues: Vec<_> = state.live.values().cloned().collect();
        issues.sort_by_key(|i| i.opened_at);
        issues
    }

    /// Recently closed issues, newest first
    pub fn recent(&self, limit: usize) -> Vec<Issue> {
        let state = self.state.read();
        state.recent.iter().rev().take(limit).cloned().collect()
    }

    /// Drop all live issues for a component (used on unregister)
    pub fn clear_component(&self, component: &str) {
        let mut state = self.state.write();
        let keys: Vec<_> = state
            .live
            .keys()
            .filter(|(c, _)| c == component)
            .cloned()
            .collect();
        for key in keys {
            if let Some(issue) = state.live.remove(&key) {
                state.by_id.remove(&issue.id);
            }
        }
    }

    /// Time of the most recent ingest, if any
    pub fn last_ingest(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.state.read().last_ingest
    }

    fn resolve_locked(
        state: &mut TrackerState,
        key: &(String, String),
        reason: &str,
        events: &mut Vec<(EventKind, serde_json::Value)>,
    ) {
        let Some(mut issue) = state.live.remove(key) else {
            return;
        };
        state.by_id.remove(&issue.id);
        issue.status = IssueStatus::Resolved;
        info!(
            component = %issue.component,
            metric = %issue.metric_name,
            reason,
            "Issue resolved"
        );
        events.push((
            EventKind::IssueResolved,
            json!({
                "issue_id": issue.id,
                "component": issue.component,
                "metric": issue.metric_name,
                "reason": reason,
            }),
        ));
        if state.recent.len() == RECENT_CAP {
            state.recent.pop_front();
        }
        state.recent.push_back(issue);
    }

    async fn flush_events(&self, events: Vec<(EventKind, serde_json::Value)>) {
        for (kind, payload) in events {
            crate::events::emit(self.sink.as_ref(), kind, payload).await;
        }
    }
}

/// Classify one metric against its thresholds
///
/// Returns the violated severity and description, or `None` when the metric
/// passes. When several thresholds match, the most severe violated one
/// wins. A metric without thresholds still violates when its producer
/// marked it unhealthy; the synthetic check-failure metric is High.
fn classify(
    metric: &HealthMetric,
    thresholds: &std::collections::BTreeMap<String, Vec<Threshold>>,
) -> Option<(Severity, String)> {
    if let Some(matching) = thresholds.get(&metric.name) {
        return matching
            .iter()
            .filter(|t| t.violated(&metric.value))
            .max_by_key(|t| t.severity)
            .map(|t| (t.severity, t.describe_violation(&metric.value)));
    }

    if metric.healthy {
        return None;
    }

    if metric.name == CHECK_FAILURE_METRIC {
        let reason = metric.detail.as_deref().unwrap_or("unknown failure");
        Some((Severity::High, format!("Health check failed: {reason}")))
    } else {
        let detail = metric
            .detail
            .clone()
            .unwrap_or_else(|| format!("metric {} reported unhealthy", metric.name));
        Some((Severity::Medium, detail))
    }
}
