//! Standby-mode power down.

use camera_core::hal::SleepControl;
use cortex_m::peripheral::SCB;
use embassy_stm32::pac::PWR;

/// Drops the MCU into standby, the deepest stop the part offers. Wake is a
/// full reset through the WKUP pin, so the boot sequencer runs again from
/// scratch afterwards.
pub struct StandbySleep {
    scb: SCB,
}

impl StandbySleep {
    pub fn new(scb: SCB) -> Self {
        Self { scb }
    }
}

impl SleepControl for StandbySleep {
    fn enter_low_power_sleep(&mut self) {
        PWR.cr().modify(|w| {
            w.set_pdds(true);
            w.set_cwuf(true);
        });
        self.scb.set_sleepdeep();
        loop {
            cortex_m::asm::wfi();
        }
    }
}
