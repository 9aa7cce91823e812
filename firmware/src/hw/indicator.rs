//! Active-low status LED.

use camera_core::indicator::{FlashPattern, LedLevel, StatusIndicator};
use embassy_stm32::gpio::Output;
use embassy_time::block_for;

use crate::time::to_embassy;

/// Drives the single status LED through blocking flash patterns.
///
/// Flashes block the control loop on purpose: the device is single-purpose
/// and the operator is meant to watch the LED, not race it.
pub struct StatusLed<'d> {
    output: Output<'d>,
}

impl<'d> StatusLed<'d> {
    pub fn new(output: Output<'d>) -> Self {
        Self { output }
    }

    fn drive(&mut self, level: LedLevel) {
        // Active-low wiring: pulling the pin down lights the LED.
        match level {
            LedLevel::On => self.output.set_low(),
            LedLevel::Off => self.output.set_high(),
        }
    }
}

impl StatusIndicator for StatusLed<'_> {
    fn set_idle(&mut self) {
        self.output.set_high();
    }

    fn signal(&mut self, pattern: FlashPattern) {
        for edge in pattern.edges() {
            self.drive(edge.level);
            block_for(to_embassy(edge.hold));
        }
        self.set_idle();
    }
}
