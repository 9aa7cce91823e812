//! Idle-timeout tracking for sleep entry.

use core::ops::Add;
use core::time::Duration;

/// Returns `true` once `threshold` has elapsed since the last trigger.
///
/// Pure in its inputs; the threshold boundary itself counts as idle, so an
/// elapsed time of exactly `threshold` sleeps.
pub fn should_sleep<I>(now: I, last_trigger: I, threshold: Duration) -> bool
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    now >= last_trigger + threshold
}

/// Tracks elapsed trigger inactivity against a fixed threshold.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IdleSleepMonitor {
    threshold: Duration,
}

impl IdleSleepMonitor {
    /// Creates a monitor with the configured inactivity threshold.
    #[must_use]
    pub const fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub const fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Evaluates the timeout for the current tick.
    pub fn should_sleep<I>(&self, now: I, last_trigger: I) -> bool
    where
        I: Copy + Ord + Add<Duration, Output = I>,
    {
        should_sleep(now, last_trigger, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_secs(300);

    #[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
    struct Tick(u64);

    impl Add<Duration> for Tick {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self::Output {
            Self(self.0 + u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX))
        }
    }

    fn at(millis: u64) -> Tick {
        Tick(millis)
    }

    #[test]
    fn below_threshold_never_sleeps() {
        let monitor = IdleSleepMonitor::new(THRESHOLD);
        assert!(!monitor.should_sleep(at(0), at(0)));
        assert!(!monitor.should_sleep(at(299_999), at(0)));
    }

    #[test]
    fn threshold_boundary_sleeps() {
        let monitor = IdleSleepMonitor::new(THRESHOLD);
        assert!(monitor.should_sleep(at(300_000), at(0)));
        assert!(monitor.should_sleep(at(300_001), at(0)));
    }

    #[test]
    fn elapsed_is_measured_from_last_trigger() {
        let monitor = IdleSleepMonitor::new(THRESHOLD);
        assert!(!monitor.should_sleep(at(500_000), at(250_000)));
        assert!(monitor.should_sleep(at(550_000), at(250_000)));
    }
}
