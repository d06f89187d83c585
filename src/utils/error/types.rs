//! Error types for the self-healing subsystem

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for the subsystem
pub type Result<T> = std::result::Result<T, HealingError>;

/// Main error type for the self-healing subsystem
///
/// Errors local to one component or one recovery action are contained and
/// logged where they occur; only registration conflicts and recovery
/// exhaustion surface to the host as actionable failures.
#[derive(Error, Debug)]
pub enum HealingError {
    /// Component registration conflict
    #[error("Component already registered: {0}")]
    DuplicateComponent(String),

    /// Component lookup failure
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Issue lookup failure
    #[error("Issue not found: {0}")]
    IssueNotFound(Uuid),

    /// A health-check callback errored or timed out
    #[error("Health check failed for component {component}: {reason}")]
    CallbackError {
        /// Component whose check failed
        component: String,
        /// Failure detail
        reason: String,
    },

    /// A threshold references a metric the check never produces
    #[error("Threshold for metric {metric} on component {component} never matched a produced metric")]
    ThresholdMisconfiguration {
        /// Component carrying the threshold
        component: String,
        /// Metric name the threshold references
        metric: String,
    },

    /// A recovery action failed or timed out
    #[error("Recovery action {action} failed: {reason}")]
    RecoveryActionError {
        /// Action that failed
        action: String,
        /// Failure detail
        reason: String,
    },

    /// All recovery attempts for an issue were used up
    #[error("Recovery exhausted for issue {issue} after {attempts} attempts")]
    RecoveryExhausted {
        /// Issue that could not be recovered
        issue: Uuid,
        /// Attempts consumed
        attempts: u32,
    },

    /// Diagnosis collaborator failure
    #[error("Diagnosis error: {0}")]
    Diagnosis(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Subsystem is stopped or draining
    #[error("Shutdown in progress: {0}")]
    Shutdown(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HealingError {
    /// Whether this error terminates handling of an issue rather than a
    /// single action or cycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, HealingError::RecoveryExhausted { .. })
    }
}
