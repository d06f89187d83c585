//! End-to-end scenarios driving the full monitoring and recovery loop

use selfheal_rs::{
    ConfigUpdate, HealingConfig, HealthMetric, IssueStatus, RecoveryActionKind,
    SelfHealingSystem, Severity, SystemStatus,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::common::{
    BrokenComponent, FailingDiagnosis, FixPolicy, ScriptedCheck, fast_config, hit_rate_min,
};

/// A degraded cache opens a medium issue; a recovered cache resolves it.
#[tokio::test]
async fn scenario_threshold_violation_opens_then_resolves() {
    let system = SelfHealingSystem::new(fast_config(false)).unwrap();
    system
        .register_component(
            "cache",
            Arc::new(ScriptedCheck::new(vec![
                vec![HealthMetric::new("hit_rate", 0.3)],
                vec![HealthMetric::new("hit_rate", 0.6)],
            ])),
            hit_rate_min(Severity::Medium),
        )
        .unwrap();
    system.start().await.unwrap();

    let findings = system.check_now().await;
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Medium);
    assert_eq!(system.list_open_issues(None).len(), 1);

    system.check_now().await;
    assert!(system.list_open_issues(None).is_empty());
    assert_eq!(system.get_health_report().status, SystemStatus::Healthy);

    system.stop().await;
}

/// With auto-recovery off, even a critical issue only surfaces in the
/// report; no recovery actions run.
#[tokio::test]
async fn scenario_manual_mode_surfaces_critical_issue() {
    let component = Arc::new(BrokenComponent::new(FixPolicy::Any));
    let system = SelfHealingSystem::new(fast_config(false)).unwrap();
    system
        .register_component("provider", component.clone(), hit_rate_min(Severity::Critical))
        .unwrap();
    system.start().await.unwrap();

    system.check_now().await;

    let report = system.get_health_report();
    assert_eq!(report.status, SystemStatus::Critical);
    assert_eq!(report.open_issues.len(), 1);
    assert_eq!(report.open_issues[0].status, IssueStatus::Open);
    assert_eq!(component.actions_applied(), 0);

    system.stop().await;
}

/// With auto-recovery on and nothing fixable, the attempt bound is hit
/// deterministically and the issue fails.
#[tokio::test]
async fn scenario_bounded_attempts_end_in_failed_issue() {
    let component = Arc::new(BrokenComponent::new(FixPolicy::Never));
    let system = SelfHealingSystem::new(HealingConfig {
        max_attempts_per_issue: 2,
        ..fast_config(true)
    })
    .unwrap();
    system
        .register_component("provider", component.clone(), hit_rate_min(Severity::High))
        .unwrap();
    system.start().await.unwrap();

    // Attempt one: plan fails, issue returns to open.
    system.check_now().await;
    let report = system.get_health_report();
    assert_eq!(report.open_issues[0].attempt_count, 1);
    assert_eq!(report.open_issues[0].status, IssueStatus::Open);

    // Attempt two: the bound is reached and the issue fails terminally.
    system.check_now().await;
    let report = system.get_health_report();
    assert_eq!(report.open_issues[0].attempt_count, 2);
    assert_eq!(report.open_issues[0].status, IssueStatus::Failed);

    // Further cycles must not schedule more attempts.
    let applied = component.actions_applied();
    system.check_now().await;
    assert_eq!(component.actions_applied(), applied);
    assert_eq!(report.open_issues[0].attempt_count, 2);

    system.stop().await;
}

/// A diagnosis collaborator that always fails still leaves a templated
/// annotation on the issue, and recovery proceeds regardless.
#[tokio::test]
async fn scenario_failing_diagnosis_falls_back_and_recovery_proceeds() {
    let provider = Arc::new(FailingDiagnosis::new());
    let component = Arc::new(BrokenComponent::new(FixPolicy::On(
        RecoveryActionKind::RetryCall,
    )));
    let system = SelfHealingSystem::builder()
        .config(fast_config(false))
        .diagnosis_provider(provider.clone())
        .build()
        .unwrap();
    system
        .register_component("provider.api", component.clone(), hit_rate_min(Severity::High))
        .unwrap();
    system.start().await.unwrap();

    system.check_now().await;

    // The collaborator was consulted and failed; the fallback annotation
    // is attached to the still-open issue.
    assert!(provider.calls.load(Ordering::SeqCst) > 0);
    let open = system.list_open_issues(None);
    let diagnosis = open[0].diagnosis.as_deref().unwrap();
    assert!(diagnosis.contains("out of range"));

    // Recovery still works once the policy allows it.
    system
        .set_config(ConfigUpdate::enable_auto_recovery())
        .await
        .unwrap();
    system.check_now().await;
    assert!(system.list_open_issues(None).is_empty());
    assert!(component.is_healthy());

    system.stop().await;
}

/// Two components violating in the same cycle recover independently: their
/// plans rendezvous inside their recovery actions, which only completes if
/// the plans run concurrently.
#[tokio::test]
async fn scenario_cross_component_recovery_is_concurrent() {
    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let a = Arc::new(BrokenComponent::new(FixPolicy::Any).with_barrier(barrier.clone()));
    let b = Arc::new(BrokenComponent::new(FixPolicy::Any).with_barrier(barrier));

    // Generous action timeout so the rendezvous itself is never the thing
    // that times out.
    let system = SelfHealingSystem::new(HealingConfig {
        action_timeout_ms: 5_000,
        ..fast_config(true)
    })
    .unwrap();
    system
        .register_component("alpha", a.clone(), hit_rate_min(Severity::High))
        .unwrap();
    system
        .register_component("beta", b.clone(), hit_rate_min(Severity::High))
        .unwrap();
    system.start().await.unwrap();

    let findings = tokio::time::timeout(Duration::from_secs(10), system.check_now())
        .await
        .expect("concurrent recovery must not deadlock");
    assert_eq!(findings.len(), 2);

    assert!(a.is_healthy());
    assert!(b.is_healthy());
    assert_eq!(system.get_health_report().status, SystemStatus::Healthy);

    system.stop().await;
}
