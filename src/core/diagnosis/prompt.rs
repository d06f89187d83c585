//! Diagnosis prompt building and templated fallback

use crate::core::issues::Issue;

/// Build the natural-language prompt for the diagnosis collaborator
pub(crate) fn build_prompt(issue: &Issue, recent: &[Issue]) -> String {
    let mut prompt = format!(
        "Analyze this system issue and identify the most likely root cause.\n\n\
         Component: {}\n\
         Metric: {}\n\
         Severity: {}\n\
         Description: {}\n",
        issue.component, issue.metric_name, issue.severity, issue.description
    );

    if !recent.is_empty() {
        prompt.push_str("\nRecently closed issues:\n");
        for past in recent.iter().take(5) {
            prompt.push_str(&format!(
                "- [{}] {} / {}: {} ({})\n",
                past.severity, past.component, past.metric_name, past.description, past.status
            ));
        }
    }

    prompt.push_str("\nRespond with a short causal explanation, two sentences at most.");
    prompt
}

/// Deterministic description used when no collaborator answer is available
pub(crate) fn fallback_description(issue: &Issue) -> String {
    format!(
        "metric {} out of range for component {}: {}{}",
        issue.metric_name,
        issue.component,
        issue.description,
        hint_for(issue)
            .map(|h| format!(" ({h})"))
            .unwrap_or_default()
    )
}

/// Rule-based resolution hint keyed on the component name
fn hint_for(issue: &Issue) -> Option<&'static str> {
    let component = issue.component.to_lowercase();
    if component.contains("memory") {
        Some("check for leaks or raise the allocation")
    } else if component.contains("provider") || component.contains("api") {
        Some("verify credentials and check for an outage or rate limit")
    } else if component.contains("model") || component.contains("local") {
        Some("verify the model file exists and its format is supported")
    } else {
        None
    }
}
