#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Monotonic clock bridging embassy-time and the portable control loop.

use core::ops::Add;
use core::time::Duration;

use embassy_time::Instant;

/// Wrapper giving [`Instant`] the `Copy + Ord + Add<Duration>` shape the
/// capture controller binds its clock parameter to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(instant: Instant) -> Self {
        Self(instant)
    }
}

impl Add<Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + to_embassy(rhs))
    }
}

/// Converts a core duration to the embassy tick domain, saturating rather
/// than panicking on out-of-range values.
pub fn to_embassy(duration: Duration) -> embassy_time::Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    embassy_time::Duration::from_micros(micros)
}
