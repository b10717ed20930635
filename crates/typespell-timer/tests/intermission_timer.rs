//! Integration tests for the intermission timer.
//!
//! Uses `start_paused` so `sleep_until` resolves as soon as the test
//! advances the clock — no real 15-second waits.

use std::time::Duration;

use tokio::time;
use typespell_timer::{IntermissionTimer, TimerConfig};

fn timer_15s() -> IntermissionTimer {
    IntermissionTimer::new(TimerConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_fired_returns_epoch_stamp_after_intermission() {
    let mut timer = timer_15s();
    timer.arm(7);

    let fired = tokio::spawn(async move { timer.fired().await });
    time::advance(Duration::from_secs(15)).await;

    assert_eq!(fired.await.unwrap(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_fired_disarms_the_timer() {
    let mut timer = timer_15s();
    timer.arm(1);

    time::advance(Duration::from_secs(15)).await;
    let epoch = timer.fired().await;

    assert_eq!(epoch, 1);
    assert!(!timer.is_armed());
}

#[tokio::test(start_paused = true)]
async fn test_disarmed_timer_pends_forever() {
    let mut timer = timer_15s();

    // With paused time, timeout() only expires because the clock
    // auto-advances — a disarmed timer must never resolve first.
    let result =
        time::timeout(Duration::from_secs(3600), timer.fired()).await;
    assert!(result.is_err(), "disarmed timer should never fire");
}

#[tokio::test(start_paused = true)]
async fn test_does_not_fire_before_deadline() {
    let mut timer = timer_15s();
    timer.arm(1);

    let result =
        time::timeout(Duration::from_secs(14), timer.fired()).await;
    assert!(result.is_err(), "timer fired before the intermission ended");
    assert!(timer.is_armed(), "losing the wait must not disarm");
}

#[tokio::test(start_paused = true)]
async fn test_rearm_restarts_the_window() {
    let mut timer = IntermissionTimer::new(TimerConfig::with_intermission(
        Duration::from_secs(10),
    ));
    timer.arm(1);
    time::advance(Duration::from_secs(5)).await;

    // Re-arm halfway through: the deadline moves out to now + 10s.
    timer.arm(2);
    let result = time::timeout(Duration::from_secs(9), timer.fired()).await;
    assert!(result.is_err());

    let epoch = time::timeout(Duration::from_secs(2), timer.fired())
        .await
        .expect("timer should fire at the new deadline");
    assert_eq!(epoch, 2);
}
