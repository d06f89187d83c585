//! # selfheal-rs
//!
//! A self-healing monitoring and recovery subsystem for long-running Rust
//! services. Hosts register named *components* with health-check callbacks
//! and per-metric thresholds; the subsystem samples them continuously,
//! deduplicates violations into severity-classified *issues*, optionally
//! annotates them with a diagnosis from a host-supplied text-generation
//! collaborator, and drives a bounded, policy-gated recovery procedure that
//! learns from past outcomes.
//!
//! ## Features
//!
//! - **Periodic monitoring**: one background task samples every component
//!   per cycle; checks run concurrently with per-check timeouts, so one
//!   stuck component never blocks the rest
//! - **Issue tracking**: at most one open issue per (component, metric),
//!   with monotonic severity escalation and automatic resolution
//! - **Advisory diagnosis**: optional natural-language diagnosis with a
//!   deterministic templated fallback; never blocks recovery
//! - **Policy-gated recovery**: severity-mapped action plans, reordered by
//!   per-component outcome history, executed with per-action timeouts and
//!   post-action verification, serialized per component
//! - **Bounded attempts**: recovery that keeps failing marks the issue
//!   `failed` and surfaces it in the health report instead of looping
//! - **Audit trail**: issue lifecycle and recovery attempts flow to an
//!   optional host event sink
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use selfheal_rs::{
//!     HealingConfig, HealthCheck, HealthMetric, SelfHealingSystem, Severity, Threshold,
//! };
//! use std::sync::Arc;
//!
//! struct CacheCheck;
//!
//! #[async_trait]
//! impl HealthCheck for CacheCheck {
//!     async fn check(&self) -> Result<Vec<HealthMetric>, String> {
//!         Ok(vec![HealthMetric::new("hit_rate", 0.92)])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = SelfHealingSystem::new(HealingConfig::default())?;
//!     system.register_component(
//!         "cache",
//!         Arc::new(CacheCheck),
//!         vec![Threshold::min("hit_rate", 0.5, Severity::Medium)],
//!     )?;
//!
//!     system.start().await?;
//!     let report = system.get_health_report();
//!     println!("status: {}", report.status);
//!     system.stop().await;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod events;
pub mod utils;

// Re-export the host-facing surface.
pub use crate::config::{ConfigUpdate, HealingConfig};
pub use crate::core::diagnosis::{DiagnosisEngine, DiagnosisProvider};
pub use crate::core::issues::{Issue, IssueStatus};
pub use crate::core::recovery::{
    ActionStatsEntry, PlanOutcome, RecoveryAction, RecoveryActionKind, RecoveryPlan, RecoveryStats,
};
pub use crate::core::registry::{Component, ComponentRegistry};
pub use crate::core::system::{
    HealthReport, SelfHealingSystem, SelfHealingSystemBuilder, SystemStatus,
};
pub use crate::core::types::{
    CHECK_FAILURE_METRIC, HealthCheck, HealthMetric, MetricValue, Severity, Threshold,
};
pub use crate::events::{AuditEvent, EventKind, EventSink, MemoryEventSink, TracingEventSink};
pub use crate::utils::error::{HealingError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "selfheal-rs");
    }
}
