//! Runtime device configuration.
//!
//! Verbosity is a runtime flag rather than a compile-time feature so both
//! quiet and chatty configurations run through the same test binary.

use core::time::Duration;

/// Trigger inactivity allowed before the camera enters low-power sleep.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Memory capability class probed during boot.
///
/// Extended memory permits the high-resolution sensor profile; without it the
/// camera falls back to the reduced profile. This is capability negotiation,
/// not a retry path.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemoryClass {
    Extended,
    Standard,
}

/// Settings threaded through boot and every control-loop tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DeviceConfig {
    /// Trigger inactivity threshold before sleep entry.
    pub idle_timeout: Duration,
    /// Memory class used to negotiate the sensor profile.
    pub memory_class: MemoryClass,
    /// Emit per-step diagnostic notes in addition to failure reports.
    pub verbose: bool,
}

impl DeviceConfig {
    /// Creates a configuration for the probed memory class, otherwise default.
    #[must_use]
    pub const fn for_memory_class(memory_class: MemoryClass) -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            memory_class,
            verbose: false,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::for_memory_class(MemoryClass::Standard)
    }
}
