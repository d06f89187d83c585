//! Issue tracking
//!
//! Deduplicates threshold violations into issues, tracks their lifecycle
//! (open → diagnosing → recovering → resolved/failed), and emits audit
//! events on every transition.

mod tracker;
mod types;


pub use tracker::IssueTracker;
pub use types::{Issue, IssueStatus};
