//! Tolerance window derivation for the pulse-ratio bit encoding.
//!
//! A transmitted bit is a low phase followed by a high phase whose durations
//! sit at a 2:1 or 1:2 ratio of the encoder oscillator period. The decoder
//! accepts a phase when its measured tick count falls inside a window of
//! ± tolerance percent around the nominal duration. Windows are derived once
//! at startup and stay immutable afterwards.

/// Tick count measured by the phase timer.
pub type Ticks = u32;

/// Accepted duration range around a nominal phase length.
///
/// Bounds are exclusive: a measurement sitting exactly on a bound is
/// rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickRange {
    pub min: Ticks,
    pub max: Ticks,
}

impl TickRange {
    /// Creates a range from its exclusive bounds.
    #[must_use]
    pub const fn new(min: Ticks, max: Ticks) -> Self {
        Self { min, max }
    }

    /// Returns `true` when the measurement falls strictly inside the range.
    #[must_use]
    pub const fn contains(self, ticks: Ticks) -> bool {
        ticks > self.min && ticks < self.max
    }
}

/// Accept windows for the short and long phase durations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ToleranceWindows {
    short: TickRange,
    long: TickRange,
    nominal_long: Ticks,
}

impl ToleranceWindows {
    /// Derives the accept windows from the phase-timer rate, the encoder
    /// oscillator frequency, and the tolerance percentage.
    ///
    /// The short nominal duration is one encoder oscillator period expressed
    /// in timer ticks (integer truncation); the long nominal is twice that.
    #[must_use]
    pub const fn derive(timer_hz: u32, encoder_osc_hz: u32, tolerance_percent: u8) -> Self {
        let nominal_short = timer_hz / encoder_osc_hz;
        let nominal_long = nominal_short * 2;
        Self {
            short: window_around(nominal_short, tolerance_percent),
            long: window_around(nominal_long, tolerance_percent),
            nominal_long,
        }
    }

    /// Accept window for the short phase duration.
    #[must_use]
    pub const fn short(&self) -> TickRange {
        self.short
    }

    /// Accept window for the long phase duration.
    #[must_use]
    pub const fn long(&self) -> TickRange {
        self.long
    }

    /// Low-phase value seeded for the start symbol of each frame.
    ///
    /// The first rising edge of a frame carries no meaningful low-phase
    /// measurement (the line was idle or in an inter-frame gap), so the
    /// capture machine substitutes the nominal long duration, which sits
    /// strictly inside the long window and cannot fail classification on
    /// its own.
    #[must_use]
    pub const fn start_low_sentinel(&self) -> Ticks {
        self.nominal_long
    }
}

const fn window_around(nominal: Ticks, tolerance_percent: u8) -> TickRange {
    let tolerance = tolerance_percent as Ticks;
    TickRange::new(
        nominal * (100 - tolerance) / 100,
        nominal * (100 + tolerance) / 100,
    )
}
