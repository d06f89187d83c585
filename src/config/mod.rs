//! Subsystem configuration
//!
//! Serde-facing configuration model with per-field defaults, partial
//! updates, validation, and YAML file loading.

mod types;
mod validation;


pub use types::{ConfigUpdate, HealingConfig};
