//! Lifecycle tests: background loop, config changes, shutdown modes

use selfheal_rs::{
    ConfigUpdate, RecoveryActionKind, SelfHealingSystem, Severity, SystemStatus,
};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{BrokenComponent, FixPolicy, fast_config, hit_rate_min};
use tokio_test::assert_ok;

/// Poll the report until the predicate holds or the deadline passes
async fn wait_for(
    system: &SelfHealingSystem,
    deadline: Duration,
    predicate: impl Fn(SystemStatus) -> bool,
) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < deadline {
        if predicate(system.get_health_report().status) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

/// The periodic background loop detects and heals a broken component
/// without any manual cycle driving.
#[tokio::test]
async fn background_loop_heals_without_intervention() {
    let component = Arc::new(BrokenComponent::new(FixPolicy::On(
        RecoveryActionKind::RetryCall,
    )));
    let system = SelfHealingSystem::new(fast_config(true)).unwrap();
    system
        .register_component("provider", component.clone(), hit_rate_min(Severity::High))
        .unwrap();

    assert_ok!(system.start().await);

    // First cycle fires immediately: issue opens, recovery runs, and a
    // following cycle observes the healthy metric.
    let healed = wait_for(&system, Duration::from_secs(10), |status| {
        status == SystemStatus::Healthy
    })
    .await;

    assert!(healed, "background loop should heal the component");
    assert!(component.is_healthy());

    system.stop().await;
    assert_eq!(system.get_health_report().status, SystemStatus::Inactive);
}

/// Changing the monitoring interval while running restarts the loop
/// transparently.
#[tokio::test]
async fn interval_change_restarts_monitor() {
    let system = SelfHealingSystem::new(fast_config(false)).unwrap();
    system.start().await.unwrap();
    assert!(system.is_running());

    system
        .set_config(ConfigUpdate {
            monitoring_interval_secs: Some(2),
            ..ConfigUpdate::default()
        })
        .await
        .unwrap();

    assert!(system.is_running());
    assert_eq!(system.config().monitoring_interval_secs, 2);

    system.stop().await;
    assert!(!system.is_running());
}

/// A hard stop returns promptly even with recovery stuck in flight.
#[tokio::test]
async fn hard_stop_aborts_in_flight_recovery() {
    let component =
        Arc::new(BrokenComponent::new(FixPolicy::Never).with_delay(Duration::from_secs(3600)));
    let system = SelfHealingSystem::builder()
        .config(selfheal_rs::HealingConfig {
            // Long action timeout so the recovery genuinely hangs.
            action_timeout_ms: 60_000,
            ..fast_config(true)
        })
        .build()
        .unwrap();
    system
        .register_component("stuck", component, hit_rate_min(Severity::High))
        .unwrap();
    system.start().await.unwrap();

    // Let the first cycle open the issue and start recovery.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let start = std::time::Instant::now();
    system.hard_stop().await;
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!system.is_running());
}

/// Stop lets the in-flight work drain and the report reflects the stopped
/// state; a stopped system can be started again.
#[tokio::test]
async fn stop_then_restart_roundtrip() {
    let system = SelfHealingSystem::new(fast_config(false)).unwrap();

    system.start().await.unwrap();
    system.stop().await;
    assert!(!system.is_running());

    system.start().await.unwrap();
    assert!(system.is_running());
    system.stop().await;
}
