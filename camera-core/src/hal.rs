//! Collaborator traits at the hardware seam.
//!
//! The control loop contains zero hardware-specific constants; everything the
//! camera touches — sensor, storage, counter store, trigger input, sleep
//! entry — sits behind these traits. Firmware binds them to real peripherals,
//! the emulator and tests bind them to fakes.

use core::fmt;

use crate::config::MemoryClass;

/// Frame resolution tiers the sensor can be asked for.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameSize {
    /// High-resolution profile, requires extended memory for frame buffers.
    Uxga,
    /// Reduced profile usable on standard memory.
    Svga,
}

/// Sensor profile negotiated at boot from the probed memory class.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SensorConfig {
    pub frame_size: FrameSize,
    pub jpeg_quality: u8,
    pub frame_buffers: u8,
}

/// Profile used when extended memory is available.
pub const EXTENDED_MEMORY_PROFILE: SensorConfig = SensorConfig {
    frame_size: FrameSize::Uxga,
    jpeg_quality: 10,
    frame_buffers: 2,
};

/// Fallback profile for standard memory.
pub const STANDARD_MEMORY_PROFILE: SensorConfig = SensorConfig {
    frame_size: FrameSize::Svga,
    jpeg_quality: 12,
    frame_buffers: 1,
};

impl SensorConfig {
    /// Selects the profile for the probed memory class.
    #[must_use]
    pub const fn for_memory_class(class: MemoryClass) -> Self {
        match class {
            MemoryClass::Extended => EXTENDED_MEMORY_PROFILE,
            MemoryClass::Standard => STANDARD_MEMORY_PROFILE,
        }
    }
}

/// Sensor driver initialization failure, with the driver's raw error code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SensorError {
    pub code: u32,
}

impl SensorError {
    #[must_use]
    pub const fn new(code: u32) -> Self {
        Self { code }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.code)
    }
}

/// Frame acquisition failure. Non-fatal; the trigger may simply be pressed
/// again.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CaptureError {
    FrameCaptureFailed,
}

/// Storage mount failure.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MountError {
    MountFailed,
}

/// File creation or write failure on the storage media.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IoError {
    FileCreateFailed,
    WriteFailed,
}

/// The image sensor driver.
pub trait ImageSensor {
    /// Brings the sensor up with the negotiated profile.
    ///
    /// # Errors
    /// Returns the driver's failure code; initialization failure is fatal for
    /// the current power cycle.
    fn initialize(&mut self, config: &SensorConfig) -> Result<(), SensorError>;

    /// Captures one encoded frame.
    ///
    /// The returned buffer borrows the sensor's frame memory and is released
    /// when the borrow ends.
    ///
    /// # Errors
    /// A failed acquisition is transient and retried only on the next trigger.
    fn capture_frame(&mut self) -> Result<&[u8], CaptureError>;
}

/// The removable-storage driver.
pub trait StorageMedia {
    /// Mounts the media's filesystem.
    ///
    /// # Errors
    /// Mount failure is fatal for the current power cycle.
    fn mount(&mut self) -> Result<(), MountError>;

    /// Reports whether media is physically present.
    ///
    /// Distinct from [`mount`](StorageMedia::mount): some controllers mount
    /// successfully against an absent-but-previously-known device.
    fn media_present(&mut self) -> bool;

    /// Creates `path` and writes `bytes` to it in one operation.
    ///
    /// # Errors
    /// Create and write failures are transient; the sequence counter stays
    /// advanced regardless.
    fn create_and_write(&mut self, path: &str, bytes: &[u8]) -> Result<(), IoError>;
}

/// The non-volatile counter store (EEPROM-style, word-addressed).
pub trait CounterStore {
    /// Reads the committed word at `addr`, or 0 if never written.
    fn read_u16(&mut self, addr: u8) -> u16;

    /// Stages a word at `addr`. Not durable until [`commit`](CounterStore::commit).
    fn write_u16(&mut self, addr: u8, value: u16);

    /// Flushes staged writes durably.
    fn commit(&mut self);

    /// Releases buffers held by the persistence layer (sleep entry only).
    fn release(&mut self);
}

/// The debounced trigger (shutter) input.
pub trait TriggerInput {
    /// Reports and consumes a pending trigger activation.
    ///
    /// Sampled exactly once per control-loop tick. Debouncing happens below
    /// this trait.
    fn was_triggered(&mut self) -> bool;
}

/// Platform entry into low-power sleep.
pub trait SleepControl {
    /// Enters deep sleep. On hardware this call never returns; the only way
    /// back is a full reset, which reruns the boot sequence. Host
    /// implementations record the call instead.
    fn enter_low_power_sleep(&mut self);
}

/// The peripheral set threaded through boot and every tick.
///
/// Bundling the collaborators keeps the control-loop signatures small and
/// makes the single-writer-per-resource rule structural: there is exactly one
/// of each and the loop holds the only mutable handle.
#[derive(Debug)]
pub struct Peripherals<S, M, C, I, D> {
    pub sensor: S,
    pub storage: M,
    pub counter: crate::counter::PersistentCounter<C>,
    pub indicator: I,
    pub diag: D,
}
