//! Recovery planning and execution
//!
//! A plan is an ordered list of actions chosen for one issue by severity
//! and reordered by what has worked for that component before. Execution
//! is sequential, bounded per action, verified against the live health
//! check after every step, and serialized per component.

mod executor;
mod history;
mod planner;
mod types;


pub use executor::RecoveryExecutor;
pub use history::{ActionStatsEntry, ActionTally, OutcomeHistory, RecoveryStats};
pub use planner::RecoveryPlanner;
pub use types::{PlanOutcome, RecoveryAction, RecoveryActionKind, RecoveryPlan};
