//! Flash patterns for the single status LED.
//!
//! The camera has no display; every externally visible condition is a fixed
//! count of timed on/off cycles on one indicator output. This module defines
//! the pattern data model, the canonical flash-code constants, and the
//! [`StatusIndicator`] trait implemented by firmware and emulator targets.
//! Patterns can also be expanded into `(level, hold)` edges so host tests can
//! verify timing without driving hardware.

use core::time::Duration;

/// Default LED on/off time within a flash group.
pub const FLASH_LENGTH: Duration = Duration::from_millis(200);

/// Pause between repeated flash groups while halted on an init failure.
pub const FAILURE_SETTLE: Duration = Duration::from_millis(1_000);

/// Flash count used to say hello (boot success) and goodbye (sleep entry).
pub const WAVE_FLASH_COUNT: u8 = 5;
/// Flash count acknowledging a captured-and-saved image.
pub const SNAP_FLASH_COUNT: u8 = 1;
/// Repeating flash count reporting a failed sensor initialization.
pub const SENSOR_INIT_FLASH_COUNT: u8 = 2;
/// Repeating flash count reporting a failed storage mount.
pub const STORAGE_MOUNT_FLASH_COUNT: u8 = 3;
/// Repeating flash count reporting absent storage media.
pub const NO_MEDIA_FLASH_COUNT: u8 = 4;

/// Logical level driven onto the indicator output.
///
/// Polarity (active-low wiring and the like) is the implementor's concern.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LedLevel {
    On,
    Off,
}

/// A fixed-count, fixed-duration flash sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlashPattern {
    pub count: u8,
    pub on_duration: Duration,
    pub off_duration: Duration,
}

impl FlashPattern {
    /// Creates a pattern with explicit timings.
    #[must_use]
    pub const fn new(count: u8, on_duration: Duration, off_duration: Duration) -> Self {
        Self {
            count,
            on_duration,
            off_duration,
        }
    }

    /// Creates a pattern with the default [`FLASH_LENGTH`] timings.
    #[must_use]
    pub const fn with_count(count: u8) -> Self {
        Self::new(count, FLASH_LENGTH, FLASH_LENGTH)
    }

    /// Five-flash "wave" used for ready and sleep acknowledgments.
    #[must_use]
    pub const fn wave() -> Self {
        Self::with_count(WAVE_FLASH_COUNT)
    }

    /// Single-flash acknowledgment for a saved image.
    #[must_use]
    pub const fn snap() -> Self {
        Self::with_count(SNAP_FLASH_COUNT)
    }

    /// Total wall-clock time the pattern blocks the caller.
    ///
    /// The trailing off period is omitted; the output simply idles off after
    /// the last flash.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let gaps = u32::from(self.count) - 1;
        self.on_duration * u32::from(self.count) + self.off_duration * gaps
    }

    /// Expands the pattern into the ordered `(level, hold)` edges an
    /// implementor must drive.
    #[must_use]
    pub fn edges(&self) -> FlashEdges {
        FlashEdges {
            pattern: *self,
            emitted: 0,
        }
    }
}

impl Default for FlashPattern {
    fn default() -> Self {
        Self::wave()
    }
}

/// One timed level the indicator output holds while signaling.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FlashEdge {
    pub level: LedLevel,
    pub hold: Duration,
}

/// Iterator over the edges of a [`FlashPattern`].
///
/// Yields `2 * count - 1` edges: on/off alternating, starting and ending on.
#[derive(Copy, Clone, Debug)]
pub struct FlashEdges {
    pattern: FlashPattern,
    emitted: u16,
}

impl Iterator for FlashEdges {
    type Item = FlashEdge;

    fn next(&mut self) -> Option<Self::Item> {
        let total = match self.pattern.count {
            0 => 0,
            count => 2 * u16::from(count) - 1,
        };
        if self.emitted >= total {
            return None;
        }
        let edge = if self.emitted % 2 == 0 {
            FlashEdge {
                level: LedLevel::On,
                hold: self.pattern.on_duration,
            }
        } else {
            FlashEdge {
                level: LedLevel::Off,
                hold: self.pattern.off_duration,
            }
        };
        self.emitted += 1;
        Some(edge)
    }
}

/// Abstraction over the physical status light.
///
/// Signaling blocks the caller for the pattern's full duration. That is
/// deliberate: flash output is the device's only feedback channel, and every
/// pattern is a synchronization point in the control flow, not fire-and-forget.
pub trait StatusIndicator {
    /// Drives the output to its inactive idle level.
    fn set_idle(&mut self);

    /// Drives the full pattern, blocking until the last flash ends.
    fn signal(&mut self, pattern: FlashPattern);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_pattern_uses_default_timings() {
        let wave = FlashPattern::wave();
        assert_eq!(wave.count, WAVE_FLASH_COUNT);
        assert_eq!(wave.on_duration, FLASH_LENGTH);
        assert_eq!(wave.off_duration, FLASH_LENGTH);
        assert_eq!(FlashPattern::default(), wave);
    }

    #[test]
    fn edges_alternate_and_end_on() {
        let edges: heapless::Vec<FlashEdge, 16> = FlashPattern::with_count(3).edges().collect();
        assert_eq!(edges.len(), 5);
        assert_eq!(edges[0].level, LedLevel::On);
        assert_eq!(edges[1].level, LedLevel::Off);
        assert_eq!(edges[4].level, LedLevel::On);
        assert!(edges.iter().all(|edge| edge.hold == FLASH_LENGTH));
    }

    #[test]
    fn snap_emits_single_edge() {
        let edges: heapless::Vec<FlashEdge, 4> = FlashPattern::snap().edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].level, LedLevel::On);
    }

    #[test]
    fn total_duration_counts_gaps_between_flashes() {
        let pattern = FlashPattern::with_count(2);
        assert_eq!(pattern.total_duration(), FLASH_LENGTH * 3);
        assert_eq!(FlashPattern::with_count(0).total_duration(), Duration::ZERO);
        assert_eq!(FlashPattern::snap().total_duration(), FLASH_LENGTH);
    }
}
