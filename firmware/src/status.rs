#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Shared status snapshot for the firmware target.
//!
//! The control loop publishes its state through lock-free atomics so a
//! diagnostic heartbeat can read a consistent-enough picture without
//! borrowing into the loop itself.

use camera_core::boot::InitFailureKind;
use camera_core::capture::{DeviceState, TickOutcome};
use portable_atomic::{AtomicU8, AtomicU16, AtomicU32, Ordering};

const STATE_INITIALIZING: u8 = 0;
const STATE_READY: u8 = 1;
const STATE_CAPTURING: u8 = 2;
const STATE_SLEEPING: u8 = 3;
const STATE_HALTED_SENSOR: u8 = 4;
const STATE_HALTED_MOUNT: u8 = 5;
const STATE_HALTED_MEDIA: u8 = 6;

static DEVICE_STATE: AtomicU8 = AtomicU8::new(STATE_INITIALIZING);
static SEQUENCE: AtomicU16 = AtomicU16::new(0);
static CAPTURES: AtomicU32 = AtomicU32::new(0);
static CAPTURE_FAILURES: AtomicU32 = AtomicU32::new(0);
static SAVE_FAILURES: AtomicU32 = AtomicU32::new(0);

fn encode_state(state: DeviceState) -> u8 {
    match state {
        DeviceState::Initializing => STATE_INITIALIZING,
        DeviceState::Ready => STATE_READY,
        DeviceState::Capturing => STATE_CAPTURING,
        DeviceState::Sleeping => STATE_SLEEPING,
        DeviceState::HaltedOnInitFailure(kind) => match kind {
            InitFailureKind::SensorInitFailed => STATE_HALTED_SENSOR,
            InitFailureKind::StorageMountFailed => STATE_HALTED_MOUNT,
            InitFailureKind::NoMediaPresent => STATE_HALTED_MEDIA,
        },
    }
}

fn decode_state(raw: u8) -> DeviceState {
    match raw {
        STATE_READY => DeviceState::Ready,
        STATE_CAPTURING => DeviceState::Capturing,
        STATE_SLEEPING => DeviceState::Sleeping,
        STATE_HALTED_SENSOR => {
            DeviceState::HaltedOnInitFailure(InitFailureKind::SensorInitFailed)
        }
        STATE_HALTED_MOUNT => {
            DeviceState::HaltedOnInitFailure(InitFailureKind::StorageMountFailed)
        }
        STATE_HALTED_MEDIA => DeviceState::HaltedOnInitFailure(InitFailureKind::NoMediaPresent),
        _ => DeviceState::Initializing,
    }
}

pub fn record_state(state: DeviceState) {
    DEVICE_STATE.store(encode_state(state), Ordering::Relaxed);
}

pub fn record_sequence(sequence: u16) {
    SEQUENCE.store(sequence, Ordering::Relaxed);
}

pub fn record_outcome(outcome: TickOutcome, sequence: u16) {
    SEQUENCE.store(sequence, Ordering::Relaxed);
    match outcome {
        TickOutcome::Captured(_) => {
            CAPTURES.fetch_add(1, Ordering::Relaxed);
        }
        TickOutcome::CaptureFailed => {
            CAPTURE_FAILURES.fetch_add(1, Ordering::Relaxed);
        }
        TickOutcome::SaveFailed(_) => {
            SAVE_FAILURES.fetch_add(1, Ordering::Relaxed);
        }
        TickOutcome::Idle | TickOutcome::EnteredSleep => {}
    }
}

#[derive(Copy, Clone, Debug)]
pub struct StatusSnapshot {
    pub state: DeviceState,
    pub sequence: u16,
    pub captures: u32,
    pub capture_failures: u32,
    pub save_failures: u32,
}

pub fn snapshot() -> StatusSnapshot {
    StatusSnapshot {
        state: decode_state(DEVICE_STATE.load(Ordering::Relaxed)),
        sequence: SEQUENCE.load(Ordering::Relaxed),
        captures: CAPTURES.load(Ordering::Relaxed),
        capture_failures: CAPTURE_FAILURES.load(Ordering::Relaxed),
        save_failures: SAVE_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test only: the statics are process-wide and the test harness runs
    // in parallel.
    #[test]
    fn snapshot_reflects_recorded_state_and_tallies() {
        record_state(DeviceState::Capturing);
        assert_eq!(snapshot().state, DeviceState::Capturing);

        record_state(DeviceState::HaltedOnInitFailure(
            InitFailureKind::NoMediaPresent,
        ));
        assert_eq!(
            snapshot().state,
            DeviceState::HaltedOnInitFailure(InitFailureKind::NoMediaPresent)
        );

        let before = snapshot();
        record_outcome(TickOutcome::Captured(7), 7);
        record_outcome(TickOutcome::SaveFailed(8), 8);
        let after = snapshot();
        assert_eq!(after.sequence, 8);
        assert_eq!(after.captures, before.captures + 1);
        assert_eq!(after.save_failures, before.save_failures + 1);
        assert_eq!(after.capture_failures, before.capture_failures);
    }
}
