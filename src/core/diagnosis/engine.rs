//! Diagnosis engine implementation

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::issues::Issue;
use crate::core::types::Severity;
use crate::utils::error::Result;

use super::prompt::{build_prompt, fallback_description};

/// Collaborator diagnoses cached per live issue
const CACHE_CAP: usize = 256;

/// Text-generation collaborator used for issue diagnosis
///
/// Any error is treated as "unavailable"; the engine falls back to a
/// templated description and the issue proceeds through recovery normally.
#[async_trait]
pub trait DiagnosisProvider: Send + Sync {
    /// Produce a short causal explanation for the given prompt
    async fn generate_diagnosis(&self, prompt: &str) -> Result<String>;
}

struct DiagnosisCache {
    entries: HashMap<Uuid, String>,
    order: VecDeque<Uuid>,
}

/// Produces advisory diagnosis annotations for issues
pub struct DiagnosisEngine {
    provider: Option<Arc<dyn DiagnosisProvider>>,
    cache: RwLock<DiagnosisCache>,
}

impl DiagnosisEngine {
    /// Create an engine with an optional collaborator
    pub fn new(provider: Option<Arc<dyn DiagnosisProvider>>) -> Self {
        Self {
            provider,
            cache: RwLock::new(DiagnosisCache {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Whether a collaborator is configured
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Diagnose an issue, never failing
    ///
    /// The collaborator is consulted only for issues at or above
    /// `min_severity` and is bounded by `timeout`; everything else gets the
    /// deterministic fallback. Collaborator answers are cached per issue id
    /// so one open lifecycle is diagnosed at most once.
    pub async fn diagnose(
        &self,
        issue: &Issue,
        recent: &[Issue],
        min_severity: Severity,
        timeout: Duration,
    ) -> String {
        if let Some(cached) = self.cache.read().entries.get(&issue.id) {
            return cached.clone();
        }

        if issue.severity < min_severity {
            return fallback_description(issue);
        }

        let Some(provider) = self.provider.as_ref() else {
            return fallback_description(issue);
        };

        let prompt = build_prompt(issue, recent);
        match tokio::time::timeout(timeout, provider.generate_diagnosis(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                let text = text.trim().to_string();
                debug!(issue_id = %issue.id, "Diagnosis collaborator answered");
                self.cache_insert(issue.id, text.clone());
                text
            }
            Ok(Ok(_)) => {
                warn!(issue_id = %issue.id, "Diagnosis collaborator returned empty text");
                fallback_description(issue)
            }
            Ok(Err(e)) => {
                warn!(issue_id = %issue.id, error = %e, "Diagnosis collaborator unavailable");
                fallback_description(issue)
            }
            Err(_) => {
                warn!(issue_id = %issue.id, ?timeout, "Diagnosis collaborator timed out");
                fallback_description(issue)
            }
        }
    }

    /// Drop the cached diagnosis for a closed issue
    pub fn forget(&self, issue_id: Uuid) {
        let mut cache = self.cache.write();
        if cache.entries.remove(&issue_id).is_some() {
            cache.order.retain(|id| *id != issue_id);
        }
    }

    fn cache_insert(&self, issue_id: Uuid, text: String) {
        let mut cache = self.cache.write();
        if cache.entries.len() == CACHE_CAP {
            if let Some(evicted) = cache.order.pop_front() {
                cache.entries.remove(&evicted);
            }
        }
        if cache.entries.insert(issue_id, text).is_none() {
            cache.order.push_back(issue_id);
        }
    }
}
