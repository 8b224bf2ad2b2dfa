use avatar_sync::config::InactivityConfig;
use avatar_sync::{InactivityMonitor, InactivityPhase};
use std::time::Duration;
use tokio::time::Instant;

fn monitor() -> InactivityMonitor {
    InactivityMonitor::new(&InactivityConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_starts_disarmed() {
    let mut monitor = monitor();
    assert_eq!(monitor.phase(), InactivityPhase::Disarmed);
    assert!(monitor.deadline().is_none());
    assert!(!monitor.fire(Instant::now()));
}

#[tokio::test(start_paused = true)]
async fn test_arm_schedules_countdown() {
    let mut monitor = monitor();
    let now = Instant::now();

    assert!(!monitor.arm(now));
    assert!(monitor.is_countdown_pending());
    assert_eq!(monitor.deadline(), Some(now + Duration::from_secs(30)));
}

#[tokio::test(start_paused = true)]
async fn test_fire_before_deadline_does_nothing() {
    let mut monitor = monitor();
    let now = Instant::now();
    monitor.arm(now);

    assert!(!monitor.fire(now + Duration::from_secs(29)));
    assert!(monitor.is_countdown_pending());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_turns_into_toggling() {
    let mut monitor = monitor();
    let now = Instant::now();
    monitor.arm(now);

    let deadline = now + Duration::from_secs(30);
    assert!(monitor.fire(deadline));
    assert!(monitor.is_toggling());
    assert!(!monitor.is_countdown_pending());
    assert_eq!(monitor.deadline(), Some(deadline + Duration::from_secs(30)));

    assert!(monitor.fire(deadline + Duration::from_secs(30)));
    assert_eq!(monitor.deadline(), Some(deadline + Duration::from_secs(60)));
}

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_countdown() {
    let mut monitor = monitor();
    let start = Instant::now();
    monitor.arm(start);
    monitor.arm(start + Duration::from_secs(20));

    assert!(!monitor.fire(start + Duration::from_secs(30)));
    assert_eq!(monitor.deadline(), Some(start + Duration::from_secs(50)));
}

#[tokio::test(start_paused = true)]
async fn test_activity_cancels_toggling() {
    let mut monitor = monitor();
    let start = Instant::now();
    monitor.arm(start);
    monitor.fire(start + Duration::from_secs(30));
    assert!(monitor.is_toggling());

    let resumed = start + Duration::from_secs(35);
    assert!(monitor.arm(resumed));
    assert!(!monitor.is_toggling());
    assert_eq!(monitor.deadline(), Some(resumed + Duration::from_secs(30)));
}

#[tokio::test(start_paused = true)]
async fn test_late_fire_does_not_burst() {
    let mut monitor = monitor();
    let start = Instant::now();
    monitor.arm(start);

    let late = start + Duration::from_secs(100);
    assert!(monitor.fire(late));
    assert_eq!(monitor.deadline(), Some(late + Duration::from_secs(30)));
    assert!(!monitor.fire(late + Duration::from_secs(1)));
}

#[tokio::test(start_paused = true)]
async fn test_disarm() {
    let mut monitor = monitor();
    let now = Instant::now();
    monitor.arm(now);
    monitor.disarm();

    assert!(monitor.deadline().is_none());
    assert!(!monitor.fire(now + Duration::from_secs(60)));
}

#[tokio::test(start_paused = true)]
async fn test_custom_delay_and_period() {
    let config = InactivityConfig {
        delay_secs: 5,
        toggle_period_secs: 2,
    };
    let mut monitor = InactivityMonitor::new(&config);
    let now = Instant::now();
    monitor.arm(now);

    assert!(monitor.fire(now + Duration::from_secs(5)));
    assert_eq!(monitor.deadline(), Some(now + Duration::from_secs(7)));
}
