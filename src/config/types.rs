//! Configuration model

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::types::Severity;
use crate::utils::error::Result;

fn default_auto_recovery() -> bool {
    false
}

fn default_min_severity() -> Severity {
    Severity::Medium
}

fn default_monitoring_interval_secs() -> u64 {
    10
}

fn default_max_attempts_per_issue() -> u32 {
    3
}

fn default_action_timeout_ms() -> u64 {
    5_000
}

/// Process-wide subsystem configuration
///
/// Durations are carried as integers so the type round-trips through YAML
/// and JSON without custom serializers; use the accessor methods where a
/// [`Duration`] is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingConfig {
    /// Whether qualifying issues are recovered automatically
    #[serde(default = "default_auto_recovery")]
    pub auto_recovery: bool,
    /// Minimum severity for diagnosis and automatic recovery
    #[serde(default = "default_min_severity")]
    pub min_severity_for_recovery: Severity,
    /// Seconds between monitoring cycles
    #[serde(default = "default_monitoring_interval_secs")]
    pub monitoring_interval_secs: u64,
    /// Recovery attempts allowed per issue before it is marked failed
    #[serde(default = "default_max_attempts_per_issue")]
    pub max_attempts_per_issue: u32,
    /// Milliseconds allowed per recovery action and health-check call
    #[serde(default = "default_action_timeout_ms")]
    pub action_timeout_ms: u64,
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            auto_recovery: default_auto_recovery(),
            min_severity_for_recovery: default_min_severity(),
            monitoring_interval_secs: default_monitoring_interval_secs(),
            max_attempts_per_issue: default_max_attempts_per_issue(),
            action_timeout_ms: default_action_timeout_ms(),
        }
    }
}

impl HealingConfig {
    /// Interval between monitoring cycles
    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval_secs)
    }

    /// Bound on each recovery action and health-check call
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Load and validate a configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply a partial update, returning the merged configuration
    pub fn merge(mut self, update: ConfigUpdate) -> Self {
        if let Some(auto_recovery) = update.auto_recovery {
            self.auto_recovery = auto_recovery;
        }
        if let Some(min_severity) = update.min_severity_for_recovery {
            self.min_severity_for_recovery = min_severity;
        }
        if let Some(interval) = update.monitoring_interval_secs {
            self.monitoring_interval_secs = interval;
        }
        if let Some(max_attempts) = update.max_attempts_per_issue {
            self.max_attempts_per_issue = max_attempts;
        }
        if let Some(timeout) = update.action_timeout_ms {
            self.action_timeout_ms = timeout;
        }
        self
    }
}

/// Partial configuration update
///
/// Every field is optional; absent fields leave the current value in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// New auto-recovery flag
    #[serde(default)]
    pub auto_recovery: Option<bool>,
    /// New minimum severity for recovery
    #[serde(default)]
    pub min_severity_for_recovery: Option<Severity>,
    /// New monitoring interval in seconds
    #[serde(default)]
    pub monitoring_interval_secs: Option<u64>,
    /// New per-issue attempt bound
    #[serde(default)]
    pub max_attempts_per_issue: Option<u32>,
    /// New action timeout in milliseconds
    #[serde(default)]
    pub action_timeout_ms: Option<u64>,
}

impl ConfigUpdate {
    /// Update enabling auto-recovery
    pub fn enable_auto_recovery() -> Self {
        Self {
            auto_recovery: Some(true),
            ..Self::default()
        }
    }
}
