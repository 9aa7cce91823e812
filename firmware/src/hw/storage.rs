//! SPI-attached SD card behind the storage seam.

use camera_core::hal::{IoError, MountError, StorageMedia};

use crate::fatname::short_image_name;
use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Blocking;
use embassy_stm32::spi::Spi;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use embedded_sdmmc::{Mode, SdCard, TimeSource, Timestamp, VolumeIdx, VolumeManager};

/// The camera has no calendar clock; every file gets the same fixed stamp.
struct NoClock;

impl TimeSource for NoClock {
    fn get_timestamp(&self) -> Timestamp {
        Timestamp {
            year_since_1970: 56,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

type SdSpiDevice<'d> = ExclusiveDevice<Spi<'d, Blocking>, Output<'d>, Delay>;

pub struct SdStorage<'d> {
    volumes: VolumeManager<SdCard<SdSpiDevice<'d>, Delay>, NoClock>,
}

impl<'d> SdStorage<'d> {
    pub fn new(spi: Spi<'d, Blocking>, chip_select: Output<'d>) -> Self {
        let device =
            ExclusiveDevice::new(spi, chip_select, Delay).expect("SD chip-select setup failed");
        let card = SdCard::new(device, Delay);
        Self {
            volumes: VolumeManager::new(card, NoClock),
        }
    }
}

impl StorageMedia for SdStorage<'_> {
    fn mount(&mut self) -> Result<(), MountError> {
        // Opening the first partition forces the card init sequence and the
        // FAT header reads; failure here is what the mount flash code means.
        match self.volumes.open_volume(VolumeIdx(0)) {
            Ok(_) => Ok(()),
            Err(_) => Err(MountError::MountFailed),
        }
    }

    fn media_present(&mut self) -> bool {
        self.volumes.device().num_bytes().is_ok()
    }

    fn create_and_write(&mut self, path: &str, bytes: &[u8]) -> Result<(), IoError> {
        // FAT short names cap the stem at eight characters, which `Image<N>`
        // outgrows at sequence 1000. Files land on disk under the `IMG<N>.JPG`
        // alias; diagnostics keep reporting the logical path.
        let name = short_image_name(path);

        let volume = self
            .volumes
            .open_volume(VolumeIdx(0))
            .map_err(|_| IoError::FileCreateFailed)?;
        let root = volume
            .open_root_dir()
            .map_err(|_| IoError::FileCreateFailed)?;
        let mut file = root
            .open_file_in_dir(name.as_str(), Mode::ReadWriteCreateOrTruncate)
            .map_err(|_| IoError::FileCreateFailed)?;
        file.write(bytes).map_err(|_| IoError::WriteFailed)?;
        file.close().map_err(|_| IoError::WriteFailed)
    }
}
