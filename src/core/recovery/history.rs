//! Per-component recovery outcome history
//!
//! A simple scoring table, not a learned model: success/failure tallies per
//! (component, action) pair, used only to reorder candidate actions so
//! behavior stays deterministic and testable.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;

use super::types::RecoveryActionKind;

/// Consecutive failures after which an action is demoted behind
/// alternatives (never excluded)
const DEMOTION_STREAK: u32 = 3;

/// Success/failure tally for one (component, action) pair
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ActionTally {
    /// Times the action was executed for the component
    pub attempts: u32,
    /// Times it reported success
    pub successes: u32,
    /// Current run of failures without an intervening success
    pub consecutive_failures: u32,
}

impl ActionTally {
    /// Net score used for promotion ordering
    fn score(&self) -> i64 {
        i64::from(self.successes) - i64::from(self.attempts - self.successes)
    }
}

/// Aggregated recovery statistics for reporting
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryStats {
    /// Tallies per component and action, sorted by component then action
    pub actions: Vec<ActionStatsEntry>,
}

/// One row of [`RecoveryStats`]
#[derive(Debug, Clone, Serialize)]
pub struct ActionStatsEntry {
    /// Component the tally belongs to
    pub component: String,
    /// Action kind
    pub action: RecoveryActionKind,
    /// Times executed
    pub attempts: u32,
    /// Times succeeded
    pub successes: u32,
}

/// Outcome history across all components
#[derive(Debug, Default)]
pub struct OutcomeHistory {
    tallies: RwLock<HashMap<(String, RecoveryActionKind), ActionTally>>,
}

impl OutcomeHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful action execution
    pub fn record_success(&self, component: &str, kind: RecoveryActionKind) {
        let mut tallies = self.tallies.write();
        let tally = tallies
            .entry((component.to_string(), kind))
            .or_default();
        tally.attempts = tally.attempts.saturating_add(1);
        tally.successes = tally.successes.saturating_add(1);
        tally.consecutive_failures = 0;
    }

    /// Record a failed action execution
    pub fn record_failure(&self, component: &str, kind: RecoveryActionKind) {
        let mut tallies = self.tallies.write();
        let tally = tallies
            .entry((component.to_string(), kind))
            .or_default();
        tally.attempts = tally.attempts.saturating_add(1);
        tally.consecutive_failures = tally.consecutive_failures.saturating_add(1);
    }

    /// Net score for an action on a component; unknown pairs score zero
    pub fn score(&self, component: &str, kind: RecoveryActionKind) -> i64 {
        self.tallies
            .read()
            .get(&(component.to_string(), kind))
            .map(ActionTally::score)
            .unwrap_or(0)
    }

    /// Whether the action is currently demoted for the component
    pub fn is_demoted(&self, component: &str, kind: RecoveryActionKind) -> bool {
        self.tallies
            .read()
            .get(&(component.to_string(), kind))
            .is_some_and(|t| t.consecutive_failures >= DEMOTION_STREAK)
    }

    /// Tally for one (component, action) pair
    pub fn tally(&self, component: &str, kind: RecoveryActionKind) -> ActionTally {
        self.tallies
            .read()
            .get(&(component.to_string(), kind))
            .copied()
            .unwrap_or_default()
    }

    /// Drop all tallies for a component (used on unregister)
    pub fn clear_component(&self, component: &str) {
        self.tallies
            .write()
            .retain(|(c, _), _| c != component);
    }

    /// Aggregated statistics snapshot
    pub fn stats(&self) -> RecoveryStats {
        let tallies = self.tallies.read();
        let mut actions: Vec<_> = tallies
            .iter()
            .map(|((component, action), tally)| ActionStatsEntry {
                component: component.clone(),
                action: *action,
                attempts: tally.attempts,
                successes: tally.successes,
            })
            .collect();
        actions.sort_by(|a, b| {
            (a.component.as_str(), a.action.to_string())
                .cmp(&(b.component.as_str(), b.action.to_string()))
        });
        RecoveryStats { actions }
    }
}
