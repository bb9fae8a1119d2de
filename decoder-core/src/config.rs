//! Decoder configuration, resolved and validated once at startup.
//!
//! Every field is a build-time constant in practice. Mode cross-dependencies
//! that the reference hardware resolved with conditional compilation are
//! checked here instead and rejected outright.

use core::fmt;

use crate::io::DATA_LINE_COUNT;
use crate::timing::ToleranceWindows;

/// Datasheet hold time: the decoder keeps its valid output asserted for
/// 2^14 of its own oscillator clocks after the signal disappears.
const TIMEOUT_DATASHEET_CLOCKS: u64 = 1 << 14;

/// Build-time decoder configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DecoderConfig {
    /// Address a frame must carry to count toward the consensus.
    pub expected_address: u8,
    /// Encoder-side oscillator frequency in Hz. Must exceed 2000 Hz.
    pub encoder_osc_hz: u32,
    /// Accepted deviation around the nominal phase durations, in percent.
    pub tolerance_percent: u8,
    /// Rate of the phase-measurement timer in Hz.
    pub timer_hz: u32,
    /// Inactivity threshold in periodic-tick units.
    pub timeout_ticks: u32,
    /// Repurposes data line 1 as a periodic alert toggle.
    pub alert_mode: bool,
    /// Enters low power at startup and after timeouts; reserves the LSB
    /// data line for the wake input.
    pub low_power: bool,
}

/// Rejected configuration combinations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Oscillator frequencies at or below 2 kHz leave too few timer ticks
    /// per period for integer window math.
    OscillatorTooSlow { encoder_osc_hz: u32 },
    /// Tolerances outside 1..=33 percent either collapse a window or let
    /// the short and long windows overlap.
    ToleranceOutOfRange { tolerance_percent: u8 },
    /// The phase timer is too coarse to resolve a tolerance band around one
    /// encoder period.
    TimerTooSlow { timer_hz: u32, encoder_osc_hz: u32 },
    /// A zero threshold would abort every capture on the first tick.
    ZeroTimeout,
    /// The alert toggle keeps the decoder awake and claims a data line the
    /// low-power wake path needs; the two modes cannot be enabled together.
    AlertConflictsWithLowPower,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OscillatorTooSlow { encoder_osc_hz } => {
                write!(f, "encoder oscillator {encoder_osc_hz} Hz is at or below 2 kHz")
            }
            ConfigError::ToleranceOutOfRange { tolerance_percent } => {
                write!(f, "tolerance {tolerance_percent}% outside 1..=33")
            }
            ConfigError::TimerTooSlow {
                timer_hz,
                encoder_osc_hz,
            } => write!(
                f,
                "{timer_hz} Hz timer cannot resolve a tolerance band at {encoder_osc_hz} Hz"
            ),
            ConfigError::ZeroTimeout => f.write_str("inactivity timeout is zero"),
            ConfigError::AlertConflictsWithLowPower => {
                f.write_str("alert mode and low-power mode cannot be combined")
            }
        }
    }
}

impl DecoderConfig {
    /// Checks the cross-field constraints. Call once at startup, before any
    /// windows are derived.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.encoder_osc_hz <= 2_000 {
            return Err(ConfigError::OscillatorTooSlow {
                encoder_osc_hz: self.encoder_osc_hz,
            });
        }
        if self.tolerance_percent < 1 || self.tolerance_percent > 33 {
            return Err(ConfigError::ToleranceOutOfRange {
                tolerance_percent: self.tolerance_percent,
            });
        }
        // With integer truncation a window only has interior points when
        // nominal * tolerance reaches one full percent-scale tick.
        let nominal_short = self.timer_hz / self.encoder_osc_hz;
        if nominal_short * (self.tolerance_percent as u32) < 100 {
            return Err(ConfigError::TimerTooSlow {
                timer_hz: self.timer_hz,
                encoder_osc_hz: self.encoder_osc_hz,
            });
        }
        if self.timeout_ticks == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.alert_mode && self.low_power {
            return Err(ConfigError::AlertConflictsWithLowPower);
        }
        Ok(())
    }

    /// Derives the tolerance windows for this configuration.
    #[must_use]
    pub const fn windows(&self) -> ToleranceWindows {
        ToleranceWindows::derive(self.timer_hz, self.encoder_osc_hz, self.tolerance_percent)
    }

    /// Number of data lines still available after mode-driven reservations.
    #[must_use]
    pub const fn available_data_lines(&self) -> usize {
        let mut lines = DATA_LINE_COUNT;
        if self.alert_mode {
            lines -= 1;
        }
        if self.low_power {
            lines -= 1;
        }
        lines
    }
}

/// Derives the inactivity threshold from the datasheet hold time.
///
/// Expressed in periodic ticks of `tick_period_us` microseconds for a
/// decoder oscillator running at `decoder_osc_hz`.
#[must_use]
pub const fn datasheet_timeout_ticks(decoder_osc_hz: u32, tick_period_us: u32) -> u32 {
    let hold_us = TIMEOUT_DATASHEET_CLOCKS * 1_000_000 / decoder_osc_hz as u64;
    (hold_us / tick_period_us as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: DecoderConfig = DecoderConfig {
        expected_address: 0xFF,
        encoder_osc_hz: 3_000,
        tolerance_percent: 5,
        timer_hz: 250_000,
        timeout_ticks: 128,
        alert_mode: false,
        low_power: false,
    };

    #[test]
    fn baseline_configuration_is_accepted() {
        assert_eq!(BASELINE.validate(), Ok(()));
        assert_eq!(BASELINE.available_data_lines(), 4);
    }

    #[test]
    fn slow_oscillators_are_rejected() {
        let config = DecoderConfig {
            encoder_osc_hz: 2_000,
            ..BASELINE
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OscillatorTooSlow {
                encoder_osc_hz: 2_000
            })
        );
    }

    #[test]
    fn tolerance_must_keep_the_windows_apart() {
        for tolerance_percent in [0, 34, 100] {
            let config = DecoderConfig {
                tolerance_percent,
                ..BASELINE
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::ToleranceOutOfRange { tolerance_percent })
            );
        }
    }

    #[test]
    fn coarse_timers_are_rejected() {
        // 19 ticks per period at 1% tolerance truncates both bounds onto
        // the nominal value.
        let config = DecoderConfig {
            timer_hz: 57_000,
            tolerance_percent: 1,
            ..BASELINE
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimerTooSlow {
                timer_hz: 57_000,
                encoder_osc_hz: 3_000
            })
        );
    }

    #[test]
    fn mode_conflict_is_rejected() {
        let config = DecoderConfig {
            alert_mode: true,
            low_power: true,
            ..BASELINE
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::AlertConflictsWithLowPower)
        );
    }

    #[test]
    fn modes_reserve_data_lines() {
        let alert = DecoderConfig {
            alert_mode: true,
            ..BASELINE
        };
        let sleepy = DecoderConfig {
            low_power: true,
            ..BASELINE
        };
        assert_eq!(alert.available_data_lines(), 3);
        assert_eq!(sleepy.available_data_lines(), 3);
    }

    #[test]
    fn datasheet_timeout_matches_the_reference_part() {
        // 2^14 clocks at 125 kHz is 131.072 ms; 1.024 ms periodic ticks.
        assert_eq!(datasheet_timeout_ticks(125_000, 1_024), 128);
        // One-millisecond ticks round down.
        assert_eq!(datasheet_timeout_ticks(125_000, 1_000), 131);
    }
}
