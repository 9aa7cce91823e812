//! OV2640 camera module on the DCMI parallel interface.
//!
//! Register programming goes over SCCB, which is close enough to I2C that the
//! blocking Embassy driver handles it. Frames arrive over DCMI into a static
//! word buffer; the sensor emits JPEG directly so the adapter only has to
//! trim the transfer down to the end-of-image marker.

use camera_core::hal::{CaptureError, FrameSize, ImageSensor, SensorConfig, SensorError};
use embassy_futures::block_on;
use embassy_stm32::dcmi::Dcmi;
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Blocking;
use embassy_stm32::peripherals::{DCMI, DMA2_CH1};

/// 7-bit SCCB address of the OV2640.
const OV2640_ADDR: u8 = 0x30;

/// DCMI transfers whole words; 96 KiB holds a worst-case SVGA JPEG with
/// margin on a board without external frame memory.
pub const FRAME_BUFFER_WORDS: usize = 24 * 1024;

/// Bank-select register; the OV2640 register map is split across two banks.
const REG_BANK_SELECT: u8 = 0xFF;
const BANK_SENSOR: u8 = 0x01;
const BANK_DSP: u8 = 0x00;
/// COM7 in the sensor bank; bit 7 is soft reset.
const REG_COM7: u8 = 0x12;
const COM7_RESET: u8 = 0x80;
/// DSP-bank quantisation scale register.
const REG_QS: u8 = 0x44;

/// Common bring-up shared by both capture profiles: soft reset, JPEG output,
/// DVP interface timing.
const INIT_COMMON: &[(u8, u8)] = &[
    (REG_BANK_SELECT, BANK_SENSOR),
    (REG_COM7, COM7_RESET),
    (REG_BANK_SELECT, BANK_DSP),
    (0x05, 0x00), // R_BYPASS: DSP enabled
    (0xDA, 0x10), // IMAGE_MODE: JPEG output
    (0xD7, 0x03),
    (0xE0, 0x00), // release resets
];

/// Full-resolution profile for boards with spare frame memory.
const PROFILE_UXGA: &[(u8, u8)] = &[
    (REG_BANK_SELECT, BANK_SENSOR),
    (REG_COM7, 0x00), // UXGA mode
    (REG_BANK_SELECT, BANK_DSP),
    (0xC0, 0xC8), // HSIZE8 1600
    (0xC1, 0x96), // VSIZE8 1200
    (0x86, 0x3D),
];

/// Reduced profile for the internal-SRAM-only configuration.
const PROFILE_SVGA: &[(u8, u8)] = &[
    (REG_BANK_SELECT, BANK_SENSOR),
    (REG_COM7, 0x40), // SVGA mode
    (REG_BANK_SELECT, BANK_DSP),
    (0xC0, 0x64), // HSIZE8 800
    (0xC1, 0x4B), // VSIZE8 600
    (0x86, 0x35),
];

pub struct Ov2640<'d> {
    sccb: I2c<'d, Blocking>,
    dcmi: Dcmi<'d, DCMI, DMA2_CH1>,
    frame: &'static mut [u32],
}

impl<'d> Ov2640<'d> {
    pub fn new(
        sccb: I2c<'d, Blocking>,
        dcmi: Dcmi<'d, DCMI, DMA2_CH1>,
        frame: &'static mut [u32],
    ) -> Self {
        Self { sccb, dcmi, frame }
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.sccb
            .blocking_write(OV2640_ADDR, &[register, value])
            .map_err(|_| SensorError::new(u32::from(register)))
    }

    fn write_registers(&mut self, table: &[(u8, u8)]) -> Result<(), SensorError> {
        for &(register, value) in table {
            self.write_register(register, value)?;
        }
        Ok(())
    }
}

impl ImageSensor for Ov2640<'_> {
    fn initialize(&mut self, config: &SensorConfig) -> Result<(), SensorError> {
        self.write_registers(INIT_COMMON)?;
        let profile = match config.frame_size {
            FrameSize::Uxga => PROFILE_UXGA,
            FrameSize::Svga => PROFILE_SVGA,
        };
        self.write_registers(profile)?;
        self.write_register(REG_BANK_SELECT, BANK_DSP)?;
        self.write_register(REG_QS, config.jpeg_quality)
    }

    fn capture_frame(&mut self) -> Result<&[u8], CaptureError> {
        // The DCMI driver is async; the control loop is deliberately
        // synchronous, so park on the transfer here.
        block_on(self.dcmi.capture(self.frame))
            .map_err(|_| CaptureError::FrameCaptureFailed)?;

        // DMA filled whole words; reinterpret as bytes to find the JPEG end.
        let bytes: &[u8] = unsafe {
            core::slice::from_raw_parts(self.frame.as_ptr().cast(), self.frame.len() * 4)
        };
        let length = jpeg_length(bytes).ok_or(CaptureError::FrameCaptureFailed)?;
        Ok(&bytes[..length])
    }
}

/// Finds the length of the JPEG payload by scanning back for the EOI marker.
fn jpeg_length(bytes: &[u8]) -> Option<usize> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    bytes
        .windows(2)
        .rposition(|pair| pair == [0xFF, 0xD9])
        .map(|index| index + 2)
}
