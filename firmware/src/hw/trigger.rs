//! Debounced shutter button.

use camera_core::hal::TriggerInput;
use embassy_stm32::exti::ExtiInput;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_time::Timer;

/// Presses arriving while a capture is in flight queue up here; anything
/// beyond the depth is dropped, which matches how a mechanical shutter
/// release feels anyway.
pub const TRIGGER_QUEUE_DEPTH: usize = 4;

const DEBOUNCE_MILLIS: u64 = 30;

pub type TriggerQueue = Channel<ThreadModeRawMutex, (), TRIGGER_QUEUE_DEPTH>;
pub type TriggerSender = Sender<'static, ThreadModeRawMutex, (), TRIGGER_QUEUE_DEPTH>;
pub type TriggerReceiver = Receiver<'static, ThreadModeRawMutex, (), TRIGGER_QUEUE_DEPTH>;

/// Control-loop side of the trigger: drains one debounced press per tick.
pub struct ShutterTrigger {
    receiver: TriggerReceiver,
}

impl ShutterTrigger {
    pub fn new(receiver: TriggerReceiver) -> Self {
        Self { receiver }
    }
}

impl TriggerInput for ShutterTrigger {
    fn was_triggered(&mut self) -> bool {
        self.receiver.try_receive().is_ok()
    }
}

/// Watches the button line and forwards debounced presses to the queue.
#[embassy_executor::task]
pub async fn debounce_task(mut button: ExtiInput<'static>, sender: TriggerSender) {
    loop {
        button.wait_for_falling_edge().await;
        Timer::after_millis(DEBOUNCE_MILLIS).await;
        if button.is_low() {
            let _ = sender.try_send(());
            // Hold edge detection until the button is released so one press
            // produces exactly one capture.
            button.wait_for_rising_edge().await;
        }
    }
}
