use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use decoder_core::capture::{DecoderEvent, PulseCapture};
use decoder_core::io::{NoopPowerController, OutputProjection, PowerController};

use crate::config;
use crate::hw::OutputLine;
use crate::telemetry::DecodeLog;

mod alert_task;
mod analyze_task;
mod capture_task;

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

/// Depth-one handoff mirroring the pending-slot contract of the core: the
/// capture task parks at most one event until analysis drains it.
pub(super) type EventChannel = Channel<ThreadModeRawMutex, DecoderEvent, 1>;

/// Arms (`true`) or disarms (`false`) the alert toggle.
pub(super) type AlertSignal = Signal<ThreadModeRawMutex, bool>;

pub(super) static DECODER_EVENTS: EventChannel = Channel::new();
pub(super) static ALERT_ARMED: AlertSignal = Signal::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let hal_config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA6,
        PA7,
        EXTI0,
        ..
    } = hal::init(hal_config);

    config::ACTIVE
        .validate()
        .expect("decoder configuration rejected");

    let din = ExtiInput::new(PA0, EXTI0, Pull::None);

    let valid_line = OutputLine::new(Output::new(PA1, Level::Low, Speed::Low));
    let mut alert_pin = None;
    let line_d9 = if config::ACTIVE.alert_mode {
        alert_pin = Some(Output::new(PA5, Level::Low, Speed::Low));
        None
    } else {
        Some(OutputLine::new(Output::new(PA5, Level::Low, Speed::Low)))
    };
    let line_d11 = if config::ACTIVE.low_power {
        None
    } else {
        Some(OutputLine::new(Output::new(PA7, Level::Low, Speed::Low)))
    };
    let data_lines = [
        Some(OutputLine::new(Output::new(PA4, Level::Low, Speed::Low))),
        line_d9,
        Some(OutputLine::new(Output::new(PA6, Level::Low, Speed::Low))),
        line_d11,
    ];
    let projection = OutputProjection::new(valid_line, data_lines);

    let capture = PulseCapture::new(config::ACTIVE.windows(), config::ACTIVE.timeout_ticks);

    // The executor idles in WFI, so the dedicated controller has nothing
    // extra to do here; the call sites stay in place for parts that need a
    // deeper stop mode.
    let mut power = NoopPowerController::new();
    if config::ACTIVE.low_power {
        power.enter_low_power();
    }

    spawner
        .spawn(capture_task::run(din, capture, DecodeLog::new()))
        .expect("failed to spawn capture task");
    spawner
        .spawn(analyze_task::run(projection, power))
        .expect("failed to spawn analysis task");
    if let Some(pin) = alert_pin {
        spawner
            .spawn(alert_task::run(&ALERT_ARMED, pin))
            .expect("failed to spawn alert task");
    }

    core::future::pending::<()>().await;
}
