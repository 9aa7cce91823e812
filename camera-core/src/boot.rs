//! Power-on boot sequencing.
//!
//! Boot is deterministic and ordered: indicator, sensor, storage mount, media
//! check, counter load, ready wave. A failure in any fallible step is terminal
//! for the power cycle — the device halts in a permanent flash-and-wait loop
//! until a human resets it. Silent partial initialization on this class of
//! hardware risks undefined behavior far worse than a clearly diagnosable
//! failure loop.

use core::fmt;

use crate::config::DeviceConfig;
use crate::diag::DiagnosticSink;
use crate::hal::{CounterStore, ImageSensor, Peripherals, SensorConfig, StorageMedia};
use crate::indicator::{
    FlashPattern, NO_MEDIA_FLASH_COUNT, SENSOR_INIT_FLASH_COUNT, STORAGE_MOUNT_FLASH_COUNT,
    StatusIndicator,
};

/// Fatal initialization failures, each mapped 1:1 to a repeating flash code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InitFailureKind {
    SensorInitFailed,
    StorageMountFailed,
    NoMediaPresent,
}

impl InitFailureKind {
    /// The repeating flash pattern reporting this failure.
    #[must_use]
    pub const fn flash_pattern(self) -> FlashPattern {
        let count = match self {
            InitFailureKind::SensorInitFailed => SENSOR_INIT_FLASH_COUNT,
            InitFailureKind::StorageMountFailed => STORAGE_MOUNT_FLASH_COUNT,
            InitFailureKind::NoMediaPresent => NO_MEDIA_FLASH_COUNT,
        };
        FlashPattern::with_count(count)
    }
}

impl fmt::Display for InitFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitFailureKind::SensorInitFailed => f.write_str("sensor-init-failed"),
            InitFailureKind::StorageMountFailed => f.write_str("storage-mount-failed"),
            InitFailureKind::NoMediaPresent => f.write_str("no-media-present"),
        }
    }
}

/// Result of one boot attempt. Computed once per power cycle and consumed
/// immediately by the entry point; never persisted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BootOutcome {
    /// Device is ready; the capture loop starts from this counter value.
    Ready { counter: u16 },
    /// Terminal for this power cycle. The runner loops the failure's flash
    /// pattern (with [`FAILURE_SETTLE`](crate::indicator::FAILURE_SETTLE)
    /// between groups) forever.
    Failed(InitFailureKind),
}

/// Runs the ordered boot sequence exactly once.
pub struct BootSequencer;

impl BootSequencer {
    /// Initializes every peripheral in order, or reports the first failure.
    ///
    /// No step beyond the failing one executes: a sensor failure leaves the
    /// storage unmounted and the counter store untouched.
    pub fn run<S, M, C, I, D>(
        parts: &mut Peripherals<S, M, C, I, D>,
        config: &DeviceConfig,
    ) -> BootOutcome
    where
        S: ImageSensor,
        M: StorageMedia,
        C: CounterStore,
        I: StatusIndicator,
        D: DiagnosticSink,
    {
        parts.indicator.set_idle();

        let profile = SensorConfig::for_memory_class(config.memory_class);
        if config.verbose {
            parts.diag.note(format_args!(
                "Sensor profile: {:?} quality={} buffers={}.",
                profile.frame_size, profile.jpeg_quality, profile.frame_buffers
            ));
        }
        if let Err(err) = parts.sensor.initialize(&profile) {
            parts
                .diag
                .note(format_args!("Camera init failed with error {err}."));
            return BootOutcome::Failed(InitFailureKind::SensorInitFailed);
        }

        if parts.storage.mount().is_err() {
            parts.diag.note(format_args!("Storage mount failed."));
            return BootOutcome::Failed(InitFailureKind::StorageMountFailed);
        }
        if config.verbose {
            parts.diag.note(format_args!("Storage mounted."));
        }

        if !parts.storage.media_present() {
            parts.diag.note(format_args!("No storage media inserted."));
            return BootOutcome::Failed(InitFailureKind::NoMediaPresent);
        }

        let counter = parts.counter.load();
        if config.verbose {
            parts
                .diag
                .note(format_args!("Last stored image was Image{counter}.jpg."));
        }

        parts.indicator.signal(FlashPattern::wave());
        if config.verbose {
            parts.diag.note(format_args!("Initialization complete."));
        }

        BootOutcome::Ready { counter }
    }
}
