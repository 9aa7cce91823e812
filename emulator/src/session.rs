use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufWriter, Write};
use std::mem;
use std::ops::Add;
use std::path::Path;
use std::time::{Duration, Instant as HostInstant};

use camera_core::boot::{BootOutcome, BootSequencer, InitFailureKind};
use camera_core::capture::{CaptureController, TickOutcome, image_path};
use camera_core::config::{DeviceConfig, MemoryClass};
use camera_core::console::{self, Command, CounterCommand, FaultTarget, ParseError};
use camera_core::counter::PersistentCounter;
use camera_core::diag::DiagnosticSink;
use camera_core::hal::{
    CaptureError, CounterStore, ImageSensor, IoError, MountError, Peripherals, SensorConfig,
    SensorError, StorageMedia,
};
use camera_core::indicator::{
    FAILURE_SETTLE, FlashPattern, NO_MEDIA_FLASH_COUNT, SENSOR_INIT_FLASH_COUNT, SNAP_FLASH_COUNT,
    STORAGE_MOUNT_FLASH_COUNT, StatusIndicator, WAVE_FLASH_COUNT,
};

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "press",
        "press                          - press the shutter button once",
    ),
    (
        "advance",
        "advance <n>[ms|s|m]            - move the device clock forward",
    ),
    (
        "status",
        "status                         - show device state and counter",
    ),
    (
        "fail",
        "fail <capture|write|mount|sensor|media> - arm a one-shot fault",
    ),
    (
        "counter",
        "counter [show|reset]           - inspect or zero the image counter",
    ),
    (
        "reset",
        "reset                          - power-cycle the device",
    ),
    (
        "help",
        "help [topic]                   - show help for a command",
    ),
    (
        "exit",
        "exit                           - end the session",
    ),
];

/// Which capture profile the emulated board reports at boot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemoryProfile {
    Standard,
    Extended,
}

impl MemoryProfile {
    pub fn from_tag(tag: &str) -> Result<Self, String> {
        if tag.eq_ignore_ascii_case("standard") {
            Ok(Self::Standard)
        } else if tag.eq_ignore_ascii_case("extended") {
            Ok(Self::Extended)
        } else {
            Err(format!("Unknown memory profile `{tag}`"))
        }
    }

    fn memory_class(self) -> MemoryClass {
        match self {
            MemoryProfile::Standard => MemoryClass::Standard,
            MemoryProfile::Extended => MemoryClass::Extended,
        }
    }

    fn log_path(self) -> &'static str {
        match self {
            MemoryProfile::Standard => "transcripts/emulator-standard.log",
            MemoryProfile::Extended => "transcripts/emulator-extended.log",
        }
    }

    fn header(self) -> &'static str {
        match self {
            MemoryProfile::Standard => "Pinhole Camera Emulator transcript (standard memory)",
            MemoryProfile::Extended => "Pinhole Camera Emulator transcript (extended memory)",
        }
    }
}

/// Virtual device clock in milliseconds. Only `advance` moves it, so idle
/// timing is exact and scriptable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct EmuInstant(u64);

impl Add<Duration> for EmuInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

#[derive(Default)]
struct EmuSensor {
    fail_init: bool,
    fail_next_capture: bool,
    profile: Option<SensorConfig>,
    frames_produced: u32,
    frame: Vec<u8>,
}

impl ImageSensor for EmuSensor {
    fn initialize(&mut self, config: &SensorConfig) -> Result<(), SensorError> {
        if mem::take(&mut self.fail_init) {
            return Err(SensorError::new(0x105));
        }
        self.profile = Some(*config);
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<&[u8], CaptureError> {
        if mem::take(&mut self.fail_next_capture) {
            return Err(CaptureError::FrameCaptureFailed);
        }
        self.frames_produced += 1;
        // A recognizable JPEG skeleton with a unique payload per frame.
        self.frame.clear();
        self.frame.extend_from_slice(&[0xFF, 0xD8]);
        self.frame.extend_from_slice(&self.frames_produced.to_be_bytes());
        self.frame.extend_from_slice(&[0xFF, 0xD9]);
        Ok(&self.frame)
    }
}

#[derive(Default)]
struct EmuStorage {
    fail_mount: bool,
    media_absent: bool,
    fail_next_write: bool,
    mounted: bool,
    files: Vec<(String, Vec<u8>)>,
}

impl StorageMedia for EmuStorage {
    fn mount(&mut self) -> Result<(), MountError> {
        if mem::take(&mut self.fail_mount) {
            return Err(MountError::MountFailed);
        }
        self.mounted = true;
        Ok(())
    }

    fn media_present(&mut self) -> bool {
        !mem::take(&mut self.media_absent)
    }

    fn create_and_write(&mut self, path: &str, bytes: &[u8]) -> Result<(), IoError> {
        if mem::take(&mut self.fail_next_write) {
            return Err(IoError::WriteFailed);
        }
        self.files.push((path.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Word store with EEPROM commit semantics; survives emulated power cycles.
#[derive(Default)]
struct EmuCounterStore {
    committed: [u16; 4],
    staged: Option<(u8, u16)>,
}

impl CounterStore for EmuCounterStore {
    fn read_u16(&mut self, addr: u8) -> u16 {
        self.committed[usize::from(addr)]
    }

    fn write_u16(&mut self, addr: u8, value: u16) {
        self.staged = Some((addr, value));
    }

    fn commit(&mut self) {
        if let Some((addr, value)) = self.staged.take() {
            self.committed[usize::from(addr)] = value;
        }
    }

    fn release(&mut self) {
        self.staged = None;
    }
}

/// Narrates flash patterns instead of blinking them.
#[derive(Default)]
struct EmuLed {
    events: Vec<String>,
}

impl StatusIndicator for EmuLed {
    fn set_idle(&mut self) {}

    fn signal(&mut self, pattern: FlashPattern) {
        let label = match pattern.count {
            SNAP_FLASH_COUNT => "snap",
            SENSOR_INIT_FLASH_COUNT => "sensor-init failure code",
            STORAGE_MOUNT_FLASH_COUNT => "storage-mount failure code",
            NO_MEDIA_FLASH_COUNT => "no-media failure code",
            WAVE_FLASH_COUNT => "wave",
            _ => "pattern",
        };
        self.events.push(format!(
            "LED: {label} ({} x {} ms flashes)",
            pattern.count,
            pattern.on_duration.as_millis()
        ));
    }
}

#[derive(Default)]
struct EmuDiagnostics {
    lines: Vec<String>,
}

impl DiagnosticSink for EmuDiagnostics {
    fn note(&mut self, line: fmt::Arguments<'_>) {
        self.lines.push(line.to_string());
    }
}

type EmuParts = Peripherals<EmuSensor, EmuStorage, EmuCounterStore, EmuLed, EmuDiagnostics>;

enum DeviceMode {
    Running(CaptureController<EmuInstant>),
    Halted(InitFailureKind),
    Sleeping,
}

/// One command's worth of output, plus whether the session is over.
pub struct Reply {
    pub lines: Vec<String>,
    pub closed: bool,
}

pub struct Session {
    config: DeviceConfig,
    parts: EmuParts,
    mode: DeviceMode,
    clock: EmuInstant,
    last_sequence: u16,
    transcript: TranscriptLogger,
    started_at: HostInstant,
}

impl Session {
    pub fn new(profile: MemoryProfile) -> io::Result<Self> {
        let mut config = DeviceConfig::for_memory_class(profile.memory_class());
        config.verbose = true;

        let parts = Peripherals {
            sensor: EmuSensor::default(),
            storage: EmuStorage::default(),
            counter: PersistentCounter::new(EmuCounterStore::default()),
            indicator: EmuLed::default(),
            diag: EmuDiagnostics::default(),
        };

        Ok(Self {
            config,
            parts,
            mode: DeviceMode::Sleeping,
            clock: EmuInstant(0),
            last_sequence: 0,
            transcript: TranscriptLogger::new(profile)?,
            started_at: HostInstant::now(),
        })
    }

    /// Runs the initial power-on boot and returns its narration.
    pub fn boot(&mut self) -> io::Result<Vec<String>> {
        let lines = self.power_on();
        self.record_output(&lines)?;
        Ok(lines)
    }

    /// Drives the whole interactive session: banner, initial boot, then one
    /// command per prompt until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> io::Result<()> {
        writeln!(
            output,
            "Pinhole Camera Emulator ready. Type `help` for commands or `exit` to quit."
        )?;
        for line in self.boot()? {
            writeln!(output, "{line}")?;
        }

        let mut line = String::new();
        loop {
            line.clear();
            write!(output, "> ")?;
            output.flush()?;

            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let reply = self.handle_command(trimmed)?;
            for response in &reply.lines {
                writeln!(output, "{response}")?;
            }
            if reply.closed {
                return Ok(());
            }
        }
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Reply> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Reply {
                lines: Vec::new(),
                closed: false,
            });
        }

        let elapsed = self.started_at.elapsed();
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, trimmed)?;

        let (lines, closed) = match console::parse(trimmed) {
            Ok(Command::Press) => (self.handle_press(), false),
            Ok(Command::Advance(duration)) => (self.handle_advance(duration), false),
            Ok(Command::Status) => (self.handle_status(), false),
            Ok(Command::Fail(target)) => (self.handle_fail(target), false),
            Ok(Command::Counter(subcommand)) => (self.handle_counter(subcommand), false),
            Ok(Command::Reset) => (self.handle_reset(), false),
            Ok(Command::Help(topic)) => (handle_help(topic), false),
            Ok(Command::Exit) => (vec!["Session closed.".to_string()], true),
            Err(ParseError::Empty) => (Vec::new(), false),
            Err(err) => (vec![format!("ERR syntax {err}")], false),
        };

        self.record_output(&lines)?;
        Ok(Reply { lines, closed })
    }

    fn handle_press(&mut self) -> Vec<String> {
        match &self.mode {
            DeviceMode::Halted(kind) => {
                return vec![format!("Device halted ({kind}); only `reset` restarts it.")];
            }
            DeviceMode::Sleeping => {
                return vec!["Device is asleep; `reset` powers it back on.".to_string()];
            }
            DeviceMode::Running(_) => {}
        }

        let outcome = self.run_tick(true);
        let mut lines = self.drain_device_output();
        match outcome {
            TickOutcome::Captured(sequence) => {
                lines.push(format!("OK captured seq={sequence}"));
            }
            TickOutcome::CaptureFailed => {
                lines.push("ERR capture-failed (counter unchanged)".to_string());
            }
            TickOutcome::SaveFailed(sequence) => {
                lines.push(format!("ERR save-failed seq={sequence} (counter advanced)"));
            }
            TickOutcome::Idle | TickOutcome::EnteredSleep => {}
        }
        lines
    }

    fn handle_advance(&mut self, duration: Duration) -> Vec<String> {
        self.clock = self.clock + duration;
        let mut lines = vec![format!(
            "Advanced {} ms (t=+{} ms).",
            duration.as_millis(),
            self.clock.0
        )];

        match &self.mode {
            DeviceMode::Running(_) => {
                let outcome = self.run_tick(false);
                lines.extend(self.drain_device_output());
                if outcome == TickOutcome::EnteredSleep {
                    self.mode = DeviceMode::Sleeping;
                    lines.push("Entered low-power sleep.".to_string());
                }
            }
            DeviceMode::Halted(kind) => {
                let period = kind.flash_pattern().total_duration() + FAILURE_SETTLE;
                lines.push(format!(
                    "Device halted; {kind} flash code repeats every {} ms.",
                    period.as_millis()
                ));
            }
            DeviceMode::Sleeping => {
                lines.push("Device asleep; clock keeps running.".to_string());
            }
        }
        lines
    }

    fn handle_status(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.mode {
            DeviceMode::Running(controller) => {
                lines.push("State: ready".to_string());
                let deadline = controller.last_trigger() + self.config.idle_timeout;
                lines.push(format!(
                    "Sleep in: {} ms",
                    deadline.0.saturating_sub(self.clock.0)
                ));
            }
            DeviceMode::Halted(kind) => lines.push(format!("State: halted ({kind})")),
            DeviceMode::Sleeping => lines.push("State: sleeping".to_string()),
        }
        lines.push(format!(
            "Counter: {} (next file {})",
            self.last_sequence,
            image_path(self.last_sequence.wrapping_add(1)).as_str()
        ));
        lines.push(format!("Files stored: {}", self.parts.storage.files.len()));
        lines.push(format!("Clock: +{} ms", self.clock.0));
        lines
    }

    fn handle_fail(&mut self, target: FaultTarget) -> Vec<String> {
        let message = match target {
            FaultTarget::Capture => {
                self.parts.sensor.fail_next_capture = true;
                "OK fault armed: capture (next frame acquisition fails)"
            }
            FaultTarget::Write => {
                self.parts.storage.fail_next_write = true;
                "OK fault armed: write (next file write fails)"
            }
            FaultTarget::Mount => {
                self.parts.storage.fail_mount = true;
                "OK fault armed: mount (takes effect on next `reset`)"
            }
            FaultTarget::Sensor => {
                self.parts.sensor.fail_init = true;
                "OK fault armed: sensor (takes effect on next `reset`)"
            }
            FaultTarget::Media => {
                self.parts.storage.media_absent = true;
                "OK fault armed: media (reads absent on next `reset`)"
            }
        };
        vec![message.to_string()]
    }

    fn handle_counter(&mut self, subcommand: CounterCommand) -> Vec<String> {
        match subcommand {
            CounterCommand::Show => vec![format!(
                "Counter: {} (next file {})",
                self.last_sequence,
                image_path(self.last_sequence.wrapping_add(1)).as_str()
            )],
            CounterCommand::Reset => {
                self.parts.counter.reset_to_zero();
                self.last_sequence = 0;
                if let DeviceMode::Running(_) = self.mode {
                    // Restart the controller so its in-memory sequence picks
                    // up the zeroed store.
                    self.mode = DeviceMode::Running(CaptureController::new(
                        0,
                        self.clock,
                        &self.config,
                    ));
                }
                vec!["OK counter reset to 0".to_string()]
            }
        }
    }

    fn handle_reset(&mut self) -> Vec<String> {
        // Power cycle: the counter store and the card contents survive, the
        // mount state and any in-flight controller do not.
        let counter = mem::replace(
            &mut self.parts.counter,
            PersistentCounter::new(EmuCounterStore::default()),
        );
        self.parts.counter = PersistentCounter::new(counter.into_store());
        self.parts.storage.mounted = false;

        let mut lines = vec!["Power cycled.".to_string()];
        lines.extend(self.power_on());
        lines
    }

    fn power_on(&mut self) -> Vec<String> {
        match BootSequencer::run(&mut self.parts, &self.config) {
            BootOutcome::Ready { counter } => {
                self.last_sequence = counter;
                self.mode = DeviceMode::Running(CaptureController::new(
                    counter,
                    self.clock,
                    &self.config,
                ));
                let mut lines = self.drain_device_output();
                lines.push(format!("Device ready. Counter at {counter}."));
                lines
            }
            BootOutcome::Failed(kind) => {
                self.mode = DeviceMode::Halted(kind);
                let period = kind.flash_pattern().total_duration() + FAILURE_SETTLE;
                let mut lines = self.drain_device_output();
                lines.push(format!(
                    "Boot halted: {kind}. Flash code repeats every {} ms.",
                    period.as_millis()
                ));
                lines
            }
        }
    }

    fn run_tick(&mut self, triggered: bool) -> TickOutcome {
        let Session {
            mode,
            parts,
            config,
            clock,
            last_sequence,
            ..
        } = self;
        match mode {
            DeviceMode::Running(controller) => {
                let outcome = controller.tick(*clock, triggered, parts, config);
                *last_sequence = controller.sequence();
                outcome
            }
            DeviceMode::Halted(_) | DeviceMode::Sleeping => TickOutcome::Idle,
        }
    }

    fn drain_device_output(&mut self) -> Vec<String> {
        let mut lines: Vec<String> = self.parts.diag.lines.drain(..).collect();
        lines.extend(self.parts.indicator.events.drain(..));
        lines
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let elapsed = self.started_at.elapsed();
        for line in lines {
            self.transcript
                .append_line(elapsed, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn handle_help(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => {
            let mut lines = vec![format!("Commands: {}", help_topic_list())];
            lines.push("Use `help <topic>` for details.".to_string());
            lines
        }
        Some(topic) => {
            for (name, text) in HELP_TOPICS {
                if topic.eq_ignore_ascii_case(name) {
                    return vec![(*text).to_string()];
                }
            }
            vec![format!(
                "Unknown help topic `{topic}`. Topics: {}",
                help_topic_list()
            )]
        }
    }
}

fn help_topic_list() -> String {
    let mut buffer = String::new();
    for (index, (name, _)) in HELP_TOPICS.iter().enumerate() {
        if index > 0 {
            buffer.push_str(", ");
        }
        buffer.push_str(name);
    }
    buffer
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(profile: MemoryProfile) -> io::Result<Self> {
        let path = Path::new(profile.log_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    fn write_header(&mut self, profile: MemoryProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds since session start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
