use embassy_futures::select::{Either, select};
use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Timer};

use super::AlertSignal;

/// Half-period of the alert square wave.
const TOGGLE_PERIOD: Duration = Duration::from_millis(5);

#[embassy_executor::task]
pub async fn run(armed_signal: &'static AlertSignal, mut pin: Output<'static>) -> ! {
    let mut armed = false;
    loop {
        if armed {
            match select(armed_signal.wait(), Timer::after(TOGGLE_PERIOD)).await {
                Either::First(next) => {
                    armed = next;
                    if !armed {
                        pin.set_low();
                    }
                }
                Either::Second(()) => pin.toggle(),
            }
        } else {
            armed = armed_signal.wait().await;
        }
    }
}
