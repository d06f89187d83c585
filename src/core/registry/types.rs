//! Registered component representation

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::types::{HealthCheck, Threshold, thresholds_by_metric};

/// A monitored component: a name, a health-check capability, and the
/// thresholds its metrics are judged against
pub struct Component {
    /// Unique component name
    pub name: String,
    /// Host-supplied health-check implementation
    pub check: Arc<dyn HealthCheck>,
    /// Thresholds, indexed by the metric name they reference
    thresholds: BTreeMap<String, Vec<Threshold>>,
    /// Registration time
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

impl Component {
    /// Create a component record
    pub fn new(
        name: impl Into<String>,
        check: Arc<dyn HealthCheck>,
        thresholds: Vec<Threshold>,
    ) -> Self {
        Self {
            name: name.into(),
            check,
            thresholds: thresholds_by_metric(&thresholds),
            registered_at: chrono::Utc::now(),
        }
    }

    /// Thresholds referencing the given metric name
    pub fn thresholds_for(&self, metric_name: &str) -> &[Threshold] {
        self.thresholds
            .get(metric_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All thresholds, indexed by metric name
    pub fn thresholds(&self) -> &BTreeMap<String, Vec<Threshold>> {
        &self.thresholds
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("thresholds", &self.thresholds)
            .field("registered_at", &self.registered_at)
            .finish_non_exhaustive()
    }
}
