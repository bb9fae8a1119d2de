//! Pin and timer adapters binding the `decoder-core` seams to the HAL.

use decoder_core::io::{DigitalLine, TimerTicks};
use decoder_core::timing::Ticks;
use embassy_stm32::gpio::Output;
use embassy_time::Instant;

/// Push-pull output pin exposed as a [`DigitalLine`].
pub struct OutputLine<'d> {
    pin: Output<'d>,
}

impl<'d> OutputLine<'d> {
    /// Wraps a configured output pin.
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

impl DigitalLine for OutputLine<'_> {
    fn read(&self) -> bool {
        self.pin.is_set_high()
    }

    fn write(&mut self, high: bool) {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}

/// Phase timer over the monotonic clock.
///
/// [`crate::config::TIMER_HZ`] is one megahertz, so one decoder tick is one
/// microsecond of the embassy instant.
pub struct MicrosTicks {
    epoch: Instant,
}

impl MicrosTicks {
    /// Starts a timer whose count begins now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl TimerTicks for MicrosTicks {
    fn now(&self) -> Ticks {
        let elapsed = Instant::now().saturating_duration_since(self.epoch);
        Ticks::try_from(elapsed.as_micros()).unwrap_or(Ticks::MAX)
    }

    fn reset(&mut self) {
        self.epoch = Instant::now();
    }
}
