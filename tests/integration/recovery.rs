//! Recovery-specific properties through the public API

use selfheal_rs::{
    HealingConfig, HealingError, SelfHealingSystem, Severity, Threshold,
};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{BrokenComponent, DoublyBroken, FixPolicy, fast_config, hit_rate_min};

/// Two issues for the same component never execute recovery concurrently;
/// the second plan queues on the per-component lock.
#[tokio::test]
async fn single_flight_recovery_per_component() {
    let component = Arc::new(DoublyBroken::new());
    let system = SelfHealingSystem::new(HealingConfig {
        max_attempts_per_issue: 1,
        ..fast_config(true)
    })
    .unwrap();
    system
        .register_component(
            "store",
            component.clone(),
            vec![
                Threshold::max("read_latency_ms", 100.0, Severity::High),
                Threshold::max("write_latency_ms", 100.0, Severity::High),
            ],
        )
        .unwrap();
    system.start().await.unwrap();

    let findings = system.check_now().await;
    assert_eq!(findings.len(), 2);

    // Both plans ran (actions were applied for each), strictly serialized.
    assert!(component.max_concurrent_actions() <= 1);

    system.stop().await;
}

/// After a graceful stop the executor refuses new plans, and a restart
/// accepts them again.
#[tokio::test]
async fn stopped_system_refuses_manual_recovery_until_restarted() {
    let component = Arc::new(BrokenComponent::new(FixPolicy::Any));
    let system = SelfHealingSystem::new(fast_config(false)).unwrap();
    system
        .register_component("cache", component.clone(), hit_rate_min(Severity::High))
        .unwrap();
    system.start().await.unwrap();

    let findings = system.check_now().await;
    let issue_id = findings[0].id;

    system.stop().await;
    let err = system.handle_issue(issue_id).await.unwrap_err();
    assert!(matches!(err, HealingError::Shutdown(_)));

    system.start().await.unwrap();
    let outcome = system.handle_issue(issue_id).await.unwrap();
    assert_eq!(outcome, selfheal_rs::PlanOutcome::Succeeded);

    system.stop().await;
}

/// Manual handling of an exhausted issue is rejected rather than breaking
/// the attempt bound.
#[tokio::test]
async fn manual_handling_respects_attempt_bound() {
    let system = SelfHealingSystem::new(HealingConfig {
        max_attempts_per_issue: 1,
        ..fast_config(true)
    })
    .unwrap();
    system
        .register_component(
            "cache",
            Arc::new(BrokenComponent::new(FixPolicy::Never)),
            hit_rate_min(Severity::High),
        )
        .unwrap();
    system.start().await.unwrap();

    let findings = system.check_now().await;
    let issue_id = findings[0].id;
    // The single allowed attempt was consumed; the issue is failed.
    let err = system.handle_issue(issue_id).await.unwrap_err();
    assert!(matches!(
        err,
        HealingError::RecoveryExhausted { attempts: 1, .. }
    ));

    system.stop().await;
}

/// A slow recovery action is bounded by the action timeout and the plan
/// moves on instead of stalling the subsystem.
#[tokio::test]
async fn slow_actions_are_bounded_by_timeout() {
    let component =
        Arc::new(BrokenComponent::new(FixPolicy::Never).with_delay(Duration::from_secs(3600)));
    let system = SelfHealingSystem::new(HealingConfig {
        max_attempts_per_issue: 1,
        action_timeout_ms: 100,
        ..fast_config(true)
    })
    .unwrap();
    system
        .register_component("slow", component, hit_rate_min(Severity::High))
        .unwrap();
    system.start().await.unwrap();

    let start = std::time::Instant::now();
    system.check_now().await;

    // Three actions and verifications, each bounded by 100ms.
    assert!(start.elapsed() < Duration::from_secs(10));

    system.stop().await;
}
