//! The capture/sleep control loop.
//!
//! One tick function, invoked in a tight unbounded loop by the runner: sample
//! the trigger, capture-and-save on activation, evaluate the idle timeout.
//! All mutable state (counter value, last-trigger timestamp, device state)
//! lives in [`CaptureController`], owned by the entry point and threaded
//! through tick calls — never ambient.

use core::fmt::Write as _;
use core::ops::Add;
use core::time::Duration;

use heapless::String;

use crate::boot::InitFailureKind;
use crate::config::DeviceConfig;
use crate::diag::DiagnosticSink;
use crate::hal::{CaptureError, CounterStore, ImageSensor, IoError, Peripherals, StorageMedia};
use crate::idle::IdleSleepMonitor;
use crate::indicator::{FlashPattern, StatusIndicator};

/// Longest possible image path: `/Image65535.jpg`.
pub const MAX_IMAGE_PATH: usize = 15;

/// Bounded path buffer for one image file.
pub type ImagePath = String<MAX_IMAGE_PATH>;

/// Derives the file name for a sequence number: `/Image<seq>.jpg`, decimal,
/// no zero padding.
#[must_use]
pub fn image_path(seq: u16) -> ImagePath {
    let mut path = ImagePath::new();
    // Cannot overflow: the buffer fits the widest u16 rendering.
    let _ = write!(path, "/Image{seq}.jpg");
    path
}

/// Top-level device lifecycle, materialized so terminal states are values.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceState {
    Initializing,
    Ready,
    Capturing,
    Sleeping,
    HaltedOnInitFailure(InitFailureKind),
}

/// What one tick did, for status publication and tests.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickOutcome {
    /// No trigger, idle threshold not reached.
    Idle,
    /// Image captured and saved under this sequence number.
    Captured(u16),
    /// Frame acquisition failed; no counter increment, no file, no flash.
    CaptureFailed,
    /// Frame acquired but the file could not be written. The counter was
    /// already committed to this number, which stays consumed.
    SaveFailed(u16),
    /// Idle threshold reached: counter shut down, goodbye wave signaled. The
    /// runner must now invoke the platform sleep entry.
    EnteredSleep,
}

/// State machine for the repeating capture loop.
#[derive(Copy, Clone, Debug)]
pub struct CaptureController<I> {
    state: DeviceState,
    sequence: u16,
    last_trigger: I,
    idle: IdleSleepMonitor,
}

impl<I> CaptureController<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Starts the loop from a successful boot.
    ///
    /// `sequence` is the counter value loaded at boot; `now` seeds the idle
    /// clock so an untouched camera sleeps one full timeout after power-on.
    #[must_use]
    pub fn new(sequence: u16, now: I, config: &DeviceConfig) -> Self {
        Self {
            state: DeviceState::Ready,
            sequence,
            last_trigger: now,
            idle: IdleSleepMonitor::new(config.idle_timeout),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> DeviceState {
        self.state
    }

    /// Last committed sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Timestamp of the last handled trigger (or boot).
    #[must_use]
    pub const fn last_trigger(&self) -> I {
        self.last_trigger
    }

    /// Runs one loop iteration.
    ///
    /// `triggered` is the debounced trigger sample for this tick. Once
    /// [`TickOutcome::EnteredSleep`] is returned the controller stays in
    /// [`DeviceState::Sleeping`] and further ticks are no-ops; only a full
    /// reset (rebooting through the boot sequencer) leaves that state.
    pub fn tick<S, M, C, Ind, D>(
        &mut self,
        now: I,
        triggered: bool,
        parts: &mut Peripherals<S, M, C, Ind, D>,
        config: &DeviceConfig,
    ) -> TickOutcome
    where
        S: ImageSensor,
        M: StorageMedia,
        C: CounterStore,
        Ind: StatusIndicator,
        D: DiagnosticSink,
    {
        if self.state == DeviceState::Sleeping {
            return TickOutcome::Idle;
        }

        let mut outcome = TickOutcome::Idle;
        if triggered {
            // Reset the idle clock before capturing so a slow or failing
            // capture cannot trip the sleep timeout mid-operation.
            self.last_trigger = now;
            self.state = DeviceState::Capturing;
            outcome = self.capture_and_save(parts, config);
            self.state = DeviceState::Ready;
        }

        if self.idle.should_sleep(now, self.last_trigger) {
            parts.counter.shutdown();
            parts.diag.note(format_args!("Going to sleep."));
            parts.indicator.signal(FlashPattern::wave());
            self.state = DeviceState::Sleeping;
            return TickOutcome::EnteredSleep;
        }

        outcome
    }

    fn capture_and_save<S, M, C, Ind, D>(
        &mut self,
        parts: &mut Peripherals<S, M, C, Ind, D>,
        config: &DeviceConfig,
    ) -> TickOutcome
    where
        S: ImageSensor,
        M: StorageMedia,
        C: CounterStore,
        Ind: StatusIndicator,
        D: DiagnosticSink,
    {
        let frame = match parts.sensor.capture_frame() {
            Ok(frame) => frame,
            Err(CaptureError::FrameCaptureFailed) => {
                parts.diag.note(format_args!("Camera capture failed."));
                return TickOutcome::CaptureFailed;
            }
        };

        // Committed before the write on purpose: sequence numbers may gap on
        // a failed save, but they can never collide or go backward.
        let seq = parts.counter.next_and_commit(self.sequence);
        self.sequence = seq;

        let path = image_path(seq);
        if config.verbose {
            parts
                .diag
                .note(format_args!("The file name for the image is '{path}'."));
        }

        match parts.storage.create_and_write(&path, frame) {
            Ok(()) => {
                parts.diag.note(format_args!(
                    "Saved image to: '{path}' ({} bytes)",
                    frame.len()
                ));
                parts.indicator.signal(FlashPattern::snap());
                TickOutcome::Captured(seq)
            }
            Err(IoError::FileCreateFailed) => {
                parts
                    .diag
                    .note(format_args!("Unable to create the file for the image."));
                TickOutcome::SaveFailed(seq)
            }
            Err(IoError::WriteFailed) => {
                parts
                    .diag
                    .note(format_args!("Unable to write the image to '{path}'."));
                TickOutcome::SaveFailed(seq)
            }
        }
    }
}
