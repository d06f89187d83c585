//! Periodic health monitoring
//!
//! One background task samples every registered component per cycle. Checks
//! run concurrently and individually bounded, so one stuck or panicking
//! component never blocks the others; their failures degrade into synthetic
//! check-failure metrics instead of propagating.

mod monitor;


pub use monitor::HealthMonitor;
