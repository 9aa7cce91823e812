#![allow(dead_code)]

//! Shared fakes for the integration tests: a millisecond mock clock and
//! in-memory stand-ins for every collaborator trait, with fault injection.

use core::ops::Add;
use core::time::Duration;

use camera_core::config::DeviceConfig;
use camera_core::counter::PersistentCounter;
use camera_core::diag::DiagnosticSink;
use camera_core::hal::{
    CaptureError, CounterStore, ImageSensor, IoError, MountError, Peripherals, SensorConfig,
    SensorError, StorageMedia,
};
use camera_core::indicator::{FlashPattern, StatusIndicator};

/// Milliseconds since a simulated power-on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct MockInstant(u64);

impl MockInstant {
    pub fn millis(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for MockInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX))
    }
}

pub struct MockSensor {
    pub frame: Vec<u8>,
    pub fail_init: bool,
    pub fail_next_capture: bool,
    pub initialized_with: Option<SensorConfig>,
    pub captures: usize,
}

impl MockSensor {
    pub fn new() -> Self {
        Self {
            frame: vec![0xFF, 0xD8, 0xFF, 0xE0],
            fail_init: false,
            fail_next_capture: false,
            initialized_with: None,
            captures: 0,
        }
    }
}

impl ImageSensor for MockSensor {
    fn initialize(&mut self, config: &SensorConfig) -> Result<(), SensorError> {
        if self.fail_init {
            return Err(SensorError::new(0x105));
        }
        self.initialized_with = Some(*config);
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<&[u8], CaptureError> {
        if self.fail_next_capture {
            self.fail_next_capture = false;
            return Err(CaptureError::FrameCaptureFailed);
        }
        self.captures += 1;
        Ok(&self.frame)
    }
}

pub struct MockStorage {
    pub fail_mount: bool,
    pub media_present: bool,
    pub fail_next_create: bool,
    pub fail_next_write: bool,
    pub mounted: bool,
    pub files: Vec<(String, Vec<u8>)>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            fail_mount: false,
            media_present: true,
            fail_next_create: false,
            fail_next_write: false,
            mounted: false,
            files: Vec::new(),
        }
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl StorageMedia for MockStorage {
    fn mount(&mut self) -> Result<(), MountError> {
        if self.fail_mount {
            return Err(MountError::MountFailed);
        }
        self.mounted = true;
        Ok(())
    }

    fn media_present(&mut self) -> bool {
        self.media_present
    }

    fn create_and_write(&mut self, path: &str, bytes: &[u8]) -> Result<(), IoError> {
        assert!(self.mounted, "write attempted before mount");
        if self.fail_next_create {
            self.fail_next_create = false;
            return Err(IoError::FileCreateFailed);
        }
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(IoError::WriteFailed);
        }
        self.files.push((path.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Commit-aware counter store: staged writes are lost unless committed,
/// mirroring the durability contract of the real non-volatile store.
#[derive(Default)]
pub struct MemoryCounterStore {
    pub committed: u16,
    pub staged: Option<u16>,
    pub released: bool,
    pub reads: usize,
    pub commits: usize,
}

impl MemoryCounterStore {
    pub fn with_value(value: u16) -> Self {
        Self {
            committed: value,
            ..Self::default()
        }
    }
}

impl CounterStore for MemoryCounterStore {
    fn read_u16(&mut self, _addr: u8) -> u16 {
        self.reads += 1;
        self.committed
    }

    fn write_u16(&mut self, _addr: u8, value: u16) {
        self.staged = Some(value);
    }

    fn commit(&mut self) {
        self.commits += 1;
        if let Some(value) = self.staged.take() {
            self.committed = value;
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[derive(Default)]
pub struct RecordingIndicator {
    pub idled: bool,
    pub patterns: Vec<FlashPattern>,
}

impl RecordingIndicator {
    pub fn flash_counts(&self) -> Vec<u8> {
        self.patterns.iter().map(|pattern| pattern.count).collect()
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set_idle(&mut self) {
        self.idled = true;
    }

    fn signal(&mut self, pattern: FlashPattern) {
        self.patterns.push(pattern);
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub lines: Vec<String>,
}

impl RecordingDiagnostics {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn note(&mut self, line: core::fmt::Arguments<'_>) {
        self.lines.push(line.to_string());
    }
}

pub type TestParts =
    Peripherals<MockSensor, MockStorage, MemoryCounterStore, RecordingIndicator, RecordingDiagnostics>;

/// Collaborators for a fresh device whose counter store was never written.
pub fn fresh_parts() -> TestParts {
    parts_with_counter(0)
}

/// Collaborators with a pre-loaded committed counter value.
pub fn parts_with_counter(value: u16) -> TestParts {
    Peripherals {
        sensor: MockSensor::new(),
        storage: MockStorage::new(),
        counter: PersistentCounter::new(MemoryCounterStore::with_value(value)),
        indicator: RecordingIndicator::default(),
        diag: RecordingDiagnostics::default(),
    }
}

pub fn default_config() -> DeviceConfig {
    DeviceConfig::default()
}
