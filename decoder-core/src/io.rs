//! Hardware seams and the output projection.
//!
//! The core never touches registers: pins are [`DigitalLine`]s, the phase
//! timer is a [`TimerTicks`], and low-power entry goes through a
//! [`PowerController`]. Firmware binds these to the HAL; the emulator and
//! the test suites substitute simulated implementations.

use crate::timing::Ticks;
use crate::validate::LatchUpdate;

/// One digital I/O line.
pub trait DigitalLine {
    /// Current logic level of the line.
    fn read(&self) -> bool;

    /// Drives the line to the given logic level.
    fn write(&mut self, high: bool);
}

/// Free-running tick counter used for phase measurement.
pub trait TimerTicks {
    /// Ticks elapsed since the last reset.
    fn now(&self) -> Ticks;

    /// Restarts the count from zero.
    fn reset(&mut self);
}

/// Low-power entry hook.
///
/// Invoked by the runtimes only at defined transition points (startup and
/// after an inactivity timeout), never inline with decoding.
pub trait PowerController {
    fn enter_low_power(&mut self);
}

/// Power controller that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPowerController;

impl NoopPowerController {
    /// Creates a new no-op power controller.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PowerController for NoopPowerController {
    fn enter_low_power(&mut self) {}
}

/// Number of data output lines in a full pin map.
pub const DATA_LINE_COUNT: usize = 4;

/// Maps the latched output onto the external pins.
///
/// Data lines are ordered most-significant bit first. A `None` entry is a
/// line surrendered to the alert toggle or reserved by the low-power wake
/// requirement; its bit is simply not projected.
pub struct OutputProjection<L: DigitalLine> {
    valid_line: L,
    data_lines: [Option<L>; DATA_LINE_COUNT],
}

impl<L: DigitalLine> OutputProjection<L> {
    /// Creates a projection over the given pins.
    #[must_use]
    pub fn new(valid_line: L, data_lines: [Option<L>; DATA_LINE_COUNT]) -> Self {
        Self {
            valid_line,
            data_lines,
        }
    }

    /// Applies one latch update to the pins.
    ///
    /// Data pins are rewritten only when the data value actually changed,
    /// and the valid line only on a valid/invalid transition. Returns `true`
    /// when a one-shot alert may be armed: a genuine data change on a valid
    /// set, never a re-affirmation of unchanged data.
    pub fn apply(&mut self, update: &LatchUpdate) -> bool {
        if update.data_changed {
            for (index, line) in self.data_lines.iter_mut().enumerate() {
                if let Some(line) = line {
                    let bit = (DATA_LINE_COUNT - 1 - index) as u8;
                    line.write((update.data >> bit) & 1 != 0);
                }
            }
        }
        if update.valid_changed {
            self.valid_line.write(update.valid);
        }
        update.valid && update.data_changed
    }

    /// Read-only access to the valid line.
    #[must_use]
    pub const fn valid_line(&self) -> &L {
        &self.valid_line
    }

    /// Read-only access to the data lines, most-significant bit first.
    #[must_use]
    pub const fn data_lines(&self) -> &[Option<L>; DATA_LINE_COUNT] {
        &self.data_lines
    }
}
