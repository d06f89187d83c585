//! Component registry implementation

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::types::{HealthCheck, Threshold};
use crate::utils::error::{HealingError, Result};

use super::types::Component;

/// Registry of monitored components
///
/// The registry and the issue tracker are the subsystem's only
/// shared-mutable structures; all mutation goes through this API.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: RwLock<HashMap<String, Arc<Component>>>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component for monitoring
    ///
    /// Fails with [`HealingError::DuplicateComponent`] if the name is taken.
    /// Threshold metric names are not validated here; a threshold that never
    /// matches a produced metric is warned about at ingest time.
    pub fn register(
        &self,
        name: impl Into<String>,
        check: Arc<dyn HealthCheck>,
        thresholds: Vec<Threshold>,
    ) -> Result<()> {
        let name = name.into();
        let mut components = self.components.write();

        if components.contains_key(&name) {
            return Err(HealingError::DuplicateComponent(name));
        }

        info!(component = %name, thresholds = thresholds.len(), "Registering component");
        components.insert(
            name.clone(),
            Arc::new(Component::new(name, check, thresholds)),
        );
        Ok(())
    }

    /// Remove a component from monitoring
    ///
    /// Idempotent; returns whether the component was present. Cancelling any
    /// in-flight recovery for the component is the caller's concern (the
    /// executor re-validates against the registry before and during a plan).
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.components.write().remove(name).is_some();
        if removed {
            info!(component = %name, "Unregistered component");
        } else {
            debug!(component = %name, "Unregister of unknown component ignored");
        }
        removed
    }

    /// Look up a component by name
    pub fn get(&self, name: &str) -> Option<Arc<Component>> {
        self.components.read().get(name).cloned()
    }

    /// Snapshot of all registered components
    pub fn list(&self) -> Vec<Arc<Component>> {
        let mut list: Vec<_> = self.components.read().values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.components.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.components.read().is_empty()
    }
}
