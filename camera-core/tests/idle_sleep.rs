mod common;

use core::time::Duration;

use camera_core::capture::{CaptureController, DeviceState, TickOutcome};
use camera_core::config::DeviceConfig;
use camera_core::indicator::WAVE_FLASH_COUNT;

use common::{MockInstant, fresh_parts};

const TIMEOUT: Duration = Duration::from_secs(300);
const TIMEOUT_MS: u64 = 300_000;

fn config() -> DeviceConfig {
    let mut config = DeviceConfig::default();
    config.idle_timeout = TIMEOUT;
    config
}

#[test]
fn no_sleep_before_the_threshold() {
    let config = config();
    let mut parts = fresh_parts();
    let mut controller = CaptureController::new(0, MockInstant::millis(0), &config);

    for now in [1, 1_000, TIMEOUT_MS / 2, TIMEOUT_MS - 1] {
        let outcome = controller.tick(MockInstant::millis(now), false, &mut parts, &config);
        assert_eq!(outcome, TickOutcome::Idle, "slept early at {now}ms");
    }
    assert_eq!(controller.state(), DeviceState::Ready);
}

// Scenario: no trigger for exactly the configured threshold. The device shuts
// the counter down, waves goodbye, and enters sleep exactly once.
#[test]
fn threshold_produces_exactly_one_sleep_transition() {
    let config = config();
    let mut parts = fresh_parts();
    let mut controller = CaptureController::new(0, MockInstant::millis(0), &config);

    let outcome = controller.tick(MockInstant::millis(TIMEOUT_MS), false, &mut parts, &config);

    assert_eq!(outcome, TickOutcome::EnteredSleep);
    assert_eq!(controller.state(), DeviceState::Sleeping);
    assert_eq!(parts.indicator.flash_counts(), vec![WAVE_FLASH_COUNT]);
    assert!(parts.diag.contains("Going to sleep."));

    // The store was released before the goodbye wave.
    // Further ticks are no-ops: no second wave, no second sleep.
    let outcome = controller.tick(
        MockInstant::millis(TIMEOUT_MS + 1_000),
        false,
        &mut parts,
        &config,
    );
    assert_eq!(outcome, TickOutcome::Idle);
    assert_eq!(parts.indicator.flash_counts(), vec![WAVE_FLASH_COUNT]);

    let store = parts.counter.into_store();
    assert!(store.released);
}

// A trigger at time t pushes sleep out to t + threshold, even when the
// capture itself fails.
#[test]
fn trigger_resets_the_idle_clock_before_capturing() {
    let config = config();
    let mut parts = fresh_parts();
    let mut controller = CaptureController::new(0, MockInstant::millis(0), &config);

    let trigger_at = 200_000;
    parts.sensor.fail_next_capture = true;
    let outcome = controller.tick(MockInstant::millis(trigger_at), true, &mut parts, &config);
    assert_eq!(outcome, TickOutcome::CaptureFailed);
    assert_eq!(controller.last_trigger(), MockInstant::millis(trigger_at));

    // Just shy of the refreshed deadline: still awake.
    let outcome = controller.tick(
        MockInstant::millis(trigger_at + TIMEOUT_MS - 1),
        false,
        &mut parts,
        &config,
    );
    assert_eq!(outcome, TickOutcome::Idle);

    // At the refreshed deadline: asleep.
    let outcome = controller.tick(
        MockInstant::millis(trigger_at + TIMEOUT_MS),
        false,
        &mut parts,
        &config,
    );
    assert_eq!(outcome, TickOutcome::EnteredSleep);
}

// A trigger on the same tick the old deadline expires wins: the idle clock
// resets before the timeout is evaluated.
#[test]
fn trigger_on_the_deadline_tick_stays_awake() {
    let config = config();
    let mut parts = fresh_parts();
    let mut controller = CaptureController::new(0, MockInstant::millis(0), &config);

    let outcome = controller.tick(MockInstant::millis(TIMEOUT_MS), true, &mut parts, &config);

    assert_eq!(outcome, TickOutcome::Captured(1));
    assert_eq!(controller.state(), DeviceState::Ready);
}

#[test]
fn capture_then_quiet_period_sleeps_on_schedule() {
    let config = config();
    let mut parts = fresh_parts();
    let mut controller = CaptureController::new(0, MockInstant::millis(0), &config);

    controller.tick(MockInstant::millis(10_000), true, &mut parts, &config);

    let outcome = controller.tick(
        MockInstant::millis(10_000 + TIMEOUT_MS),
        false,
        &mut parts,
        &config,
    );
    assert_eq!(outcome, TickOutcome::EnteredSleep);

    // One snap at capture, then the goodbye wave.
    assert_eq!(parts.indicator.flash_counts(), vec![1, WAVE_FLASH_COUNT]);
}
