//! Embassy runtime wiring for the camera control loop.

use core::fmt;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};

use camera_core::boot::{BootOutcome, BootSequencer};
use camera_core::capture::{CaptureController, DeviceState, TickOutcome};
use camera_core::config::DeviceConfig;
use camera_core::counter::PersistentCounter;
use camera_core::diag::DiagnosticSink;
use camera_core::hal::Peripherals;
use camera_core::indicator::{FAILURE_SETTLE, StatusIndicator};

use crate::hw;
use crate::hw::counter::BackupRegisterStore;
use crate::hw::indicator::StatusLed;
use crate::hw::sensor::Ov2640;
use crate::hw::sleep::StandbySleep;
use crate::hw::storage::SdStorage;
use crate::hw::trigger::{self, ShutterTrigger, TriggerQueue};
use crate::status;
use crate::time::{FirmwareInstant, to_embassy};

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

static TRIGGER_QUEUE: TriggerQueue = Channel::new();

/// How long the loop parks between polls while awake. Short enough that a
/// press never feels laggy, long enough to keep the executor mostly idle.
const TICK_PERIOD: Duration = Duration::from_millis(5);

/// Idle ticks between heartbeat log lines.
const HEARTBEAT_TICKS: u32 = 12_000;

/// Flip on for the chatty boot and capture notes.
const VERBOSE_DIAGNOSTICS: bool = false;

/// Routes control-loop diagnostics through defmt.
struct DefmtDiagnostics;

impl DiagnosticSink for DefmtDiagnostics {
    fn note(&mut self, line: fmt::Arguments<'_>) {
        defmt::info!("{}", defmt::Display2Format(&line));
    }
}

type CameraParts =
    Peripherals<Ov2640<'static>, SdStorage<'static>, BackupRegisterStore, StatusLed<'static>, DefmtDiagnostics>;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    defmt::info!("pinhole camera controller");

    let board = hw::init();
    spawner
        .spawn(trigger::debounce_task(
            board.shutter_button,
            TRIGGER_QUEUE.sender(),
        ))
        .expect("failed to spawn shutter debounce task");

    let mut config = DeviceConfig::for_memory_class(hw::probe_memory_class());
    config.verbose = VERBOSE_DIAGNOSTICS;

    let mut parts: CameraParts = Peripherals {
        sensor: board.sensor,
        storage: board.storage,
        counter: PersistentCounter::new(board.counter),
        indicator: board.indicator,
        diag: DefmtDiagnostics,
    };
    let trigger = ShutterTrigger::new(TRIGGER_QUEUE.receiver());

    let sequence = match BootSequencer::run(&mut parts, &config) {
        BootOutcome::Ready { counter } => counter,
        BootOutcome::Failed(kind) => {
            status::record_state(DeviceState::HaltedOnInitFailure(kind));
            defmt::error!("boot halted: {}", defmt::Display2Format(&kind));
            halt_with_flash_code(parts, kind).await
        }
    };

    control_loop(parts, trigger, board.sleep, sequence, config).await;
}

/// Terminal state for a failed boot: repeat the failure flash code forever.
async fn halt_with_flash_code(
    mut parts: CameraParts,
    kind: camera_core::boot::InitFailureKind,
) -> ! {
    loop {
        parts.indicator.signal(kind.flash_pattern());
        Timer::after(to_embassy(FAILURE_SETTLE)).await;
    }
}

async fn control_loop(
    mut parts: CameraParts,
    mut trigger: ShutterTrigger,
    mut sleep: StandbySleep,
    sequence: u16,
    config: DeviceConfig,
) -> ! {
    use camera_core::hal::SleepControl;

    let mut controller = CaptureController::new(sequence, FirmwareInstant::now(), &config);
    status::record_state(controller.state());
    status::record_sequence(sequence);

    let mut idle_ticks: u32 = 0;
    loop {
        let triggered = trigger.was_triggered();
        if triggered {
            // The capture blocks this task; publish the transient state first
            // so the snapshot is honest while the loop is busy.
            status::record_state(DeviceState::Capturing);
        }
        let outcome = controller.tick(FirmwareInstant::now(), triggered, &mut parts, &config);
        status::record_state(controller.state());
        status::record_outcome(outcome, controller.sequence());

        match outcome {
            TickOutcome::EnteredSleep => {
                // Does not return; wake is a reset through the WKUP pin.
                sleep.enter_low_power_sleep();
            }
            TickOutcome::Idle => {
                idle_ticks = idle_ticks.wrapping_add(1);
                if idle_ticks % HEARTBEAT_TICKS == 0 {
                    let snapshot = status::snapshot();
                    defmt::debug!(
                        "awake: state={} seq={} captures={} capture_failures={} save_failures={}",
                        defmt::Debug2Format(&snapshot.state),
                        snapshot.sequence,
                        snapshot.captures,
                        snapshot.capture_failures,
                        snapshot.save_failures,
                    );
                }
            }
            TickOutcome::Captured(_) | TickOutcome::CaptureFailed | TickOutcome::SaveFailed(_) => {
                idle_ticks = 0;
            }
        }

        Timer::after(TICK_PERIOD).await;
    }
}
