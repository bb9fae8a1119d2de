use decoder_core::capture::{CaptureEvent, DecoderEvent, EdgeTimer, PulseCapture};
use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Instant, Ticker};

use crate::config;
use crate::hw::MicrosTicks;
use crate::telemetry::DecodeLog;

use super::DECODER_EVENTS;

#[embassy_executor::task]
pub async fn run(mut din: ExtiInput<'static>, mut capture: PulseCapture, mut log: DecodeLog) -> ! {
    let mut edge_timer = EdgeTimer::new(MicrosTicks::new());
    let mut ticker = Ticker::every(Duration::from_micros(u64::from(config::TICK_PERIOD_US)));
    let sender = DECODER_EVENTS.sender();

    loop {
        let event = match select(din.wait_for_any_edge(), ticker.next()).await {
            Either::First(()) => {
                let elapsed = edge_timer.capture();
                if din.is_high() {
                    capture.rising_edge(elapsed)
                } else {
                    capture.falling_edge(elapsed)
                }
            }
            Either::Second(()) => capture.timer_tick(),
        };

        if !matches!(event, CaptureEvent::Quiet) {
            log.record(event, Instant::now());
        }

        match event {
            CaptureEvent::SetReady => {
                if let Some(set) = capture.take_ready() {
                    sender.send(DecoderEvent::FrameSetReady(set)).await;
                }
            }
            CaptureEvent::Aborted(reason) => {
                sender.send(DecoderEvent::CaptureAborted(reason)).await;
            }
            _ => {}
        }
    }
}
