//! Configuration validation

use crate::utils::error::{HealingError, Result};

use super::types::HealingConfig;

impl HealingConfig {
    /// Validate the configuration
    ///
    /// Rejects values that would stall or spin the subsystem; severity
    /// fields are closed enums and need no range check.
    pub fn validate(&self) -> Result<()> {
        if self.monitoring_interval_secs == 0 {
            return Err(HealingError::Config(
                "monitoring_interval_secs must be at least 1".to_string(),
            ));
        }

        if self.max_attempts_per_issue == 0 {
            return Err(HealingError::Config(
                "max_attempts_per_issue must be at least 1".to_string(),
            ));
        }

        if self.action_timeout_ms == 0 {
            return Err(HealingError::Config(
                "action_timeout_ms must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
