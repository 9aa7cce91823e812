//! Board bring-up for the STM32F407 pinhole camera.
//!
//! Everything hardware-specific lives under this module: pin assignments,
//! peripheral construction, and the adapters that implement the portable
//! control-loop traits from `camera-core`. The control loop itself never
//! sees a pin or a register.

pub mod counter;
pub mod indicator;
pub mod sensor;
pub mod sleep;
pub mod storage;
pub mod trigger;

use camera_core::config::MemoryClass;
use embassy_stm32 as hal;
use embassy_stm32::bind_interrupts;
use embassy_stm32::dcmi::{self, Dcmi};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::peripherals;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use static_cell::StaticCell;

use crate::hw::counter::BackupRegisterStore;
use crate::hw::indicator::StatusLed;
use crate::hw::sensor::{Ov2640, FRAME_BUFFER_WORDS};
use crate::hw::sleep::StandbySleep;
use crate::hw::storage::SdStorage;

bind_interrupts!(struct Irqs {
    DCMI => dcmi::InterruptHandler<peripherals::DCMI>;
});

/// SCCB runs at standard-mode I2C speed.
const SCCB_FREQUENCY: Hertz = Hertz(100_000);

/// SD cards must be initialised below 400 kHz; `embedded-sdmmc` raises the
/// clock itself once the card has negotiated.
const SD_INIT_FREQUENCY: Hertz = Hertz(250_000);

static FRAME_BUFFER: StaticCell<[u32; FRAME_BUFFER_WORDS]> = StaticCell::new();

/// Concrete peripherals handed to the runtime.
pub struct Board {
    pub indicator: StatusLed<'static>,
    pub sensor: Ov2640<'static>,
    pub storage: SdStorage<'static>,
    pub counter: BackupRegisterStore,
    pub shutter_button: ExtiInput<'static>,
    pub sleep: StandbySleep,
}

/// Initialises the clock tree and every peripheral the camera uses.
pub fn init() -> Board {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA4,
        PA6,
        PB6,
        PB7,
        PB8,
        PB9,
        PB12,
        PB13,
        PB14,
        PB15,
        PC4,
        PC6,
        PC7,
        PC8,
        PC9,
        PC11,
        PE5,
        PE6,
        DCMI,
        DMA2_CH1,
        EXTI0,
        I2C1,
        SPI2,
        ..
    } = hal::init(config);

    let cortex = cortex_m::Peripherals::take().expect("cortex-m peripherals already taken");

    // Status LED is wired active-low; start unlit.
    let indicator = StatusLed::new(Output::new(PC4, Level::High, Speed::Low));

    let shutter_button = ExtiInput::new(PA0, EXTI0, Pull::Up);

    let sccb = I2c::new_blocking(I2C1, PB8, PB9, SCCB_FREQUENCY, Default::default());
    let dcmi = Dcmi::new_8bit(
        DCMI, DMA2_CH1, Irqs, PC6, PC7, PC8, PC9, PC11, PB6, PE5, PE6, PB7, PA4, PA6,
        dcmi::Config::default(),
    );
    let frame = FRAME_BUFFER.init([0; FRAME_BUFFER_WORDS]);
    let sensor = Ov2640::new(sccb, dcmi, frame);

    let mut spi_config = spi::Config::default();
    spi_config.frequency = SD_INIT_FREQUENCY;
    let spi = Spi::new_blocking(SPI2, PB13, PB15, PB14, spi_config);
    let sd_cs = Output::new(PB12, Level::High, Speed::VeryHigh);
    let storage = SdStorage::new(spi, sd_cs);

    Board {
        indicator,
        sensor,
        storage,
        counter: BackupRegisterStore::new(),
        shutter_button,
        sleep: StandbySleep::new(cortex.SCB),
    }
}

/// Classifies how much frame memory the board offers.
///
/// The F407 has no external frame store, so the controller always runs the
/// conservative capture profile. Boards with SDRAM would report `Extended`
/// here after probing the FMC bank.
pub fn probe_memory_class() -> MemoryClass {
    MemoryClass::Standard
}
