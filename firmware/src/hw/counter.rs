//! Sequence counter persisted in an RTC backup register.
//!
//! The backup domain rides through standby and system resets for as long as
//! VBAT holds, which gives the same contract the control loop wants from an
//! EEPROM: reads see the last committed value, writes stage in RAM until the
//! commit lands.

use camera_core::hal::CounterStore;
use embassy_stm32::pac::{PWR, RTC};

pub struct BackupRegisterStore {
    staged: Option<(u8, u16)>,
}

impl BackupRegisterStore {
    pub fn new() -> Self {
        // Backup-domain writes stay unlocked for the device lifetime; the
        // commit path below is the only writer.
        PWR.cr().modify(|w| w.set_dbp(true));
        Self { staged: None }
    }
}

impl Default for BackupRegisterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterStore for BackupRegisterStore {
    fn read_u16(&mut self, address: u8) -> u16 {
        (RTC.bkpr(usize::from(address)).read().0 & 0xFFFF) as u16
    }

    fn write_u16(&mut self, address: u8, value: u16) {
        self.staged = Some((address, value));
    }

    fn commit(&mut self) {
        if let Some((address, value)) = self.staged.take() {
            RTC.bkpr(usize::from(address)).write(|w| w.0 = u32::from(value));
        }
    }

    fn release(&mut self) {
        self.staged = None;
    }
}
