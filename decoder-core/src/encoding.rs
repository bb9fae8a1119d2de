//! Encoder-side waveform synthesis.
//!
//! Mirrors the transmitting chip: each frame is a start symbol (a short high
//! pulse) followed by twelve payload symbols, where a one is a long low then
//! a short high and a zero is a short low then a long high. Three identical
//! frames form one transmission. Used by the integration tests and the host
//! emulator; the firmware never transmits.

use heapless::Vec;

use crate::capture::PhaseMeasurement;
use crate::frame::{FRAME_SYMBOLS, FRAMES_PER_SET, PAYLOAD_SYMBOLS};
use crate::timing::Ticks;

/// Phases of one 13-symbol frame.
pub type FramePhases = Vec<PhaseMeasurement, { FRAME_SYMBOLS as usize }>;

/// Phases of a full three-frame transmission.
pub type MessagePhases = Vec<PhaseMeasurement, { FRAME_SYMBOLS as usize * FRAMES_PER_SET }>;

/// Nominal phase durations used when synthesizing a waveform.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EncoderTiming {
    short: Ticks,
    long: Ticks,
}

impl EncoderTiming {
    /// Nominal durations for the given timer and oscillator rates.
    #[must_use]
    pub const fn nominal(timer_hz: u32, encoder_osc_hz: u32) -> Self {
        let short = timer_hz / encoder_osc_hz;
        Self {
            short,
            long: short * 2,
        }
    }

    /// Scales both durations to `percent` of nominal (100 = unchanged).
    ///
    /// Lets tests and the emulator walk a waveform toward the tolerance
    /// bounds without recomputing windows.
    #[must_use]
    pub const fn skewed(self, percent: u32) -> Self {
        Self {
            short: self.short * percent / 100,
            long: self.long * percent / 100,
        }
    }

    /// Short phase duration in ticks.
    #[must_use]
    pub const fn short(&self) -> Ticks {
        self.short
    }

    /// Long phase duration in ticks.
    #[must_use]
    pub const fn long(&self) -> Ticks {
        self.long
    }
}

/// Synthesizes the phase sequence for one frame carrying `address`/`data`.
#[must_use]
pub fn frame_phases(address: u8, data: u8, timing: EncoderTiming) -> FramePhases {
    let mut phases = FramePhases::new();
    // Start symbol. Its low side is the inter-frame gap; the receiver
    // substitutes a sentinel for it, so the nominal long duration stands in.
    phases
        .push(PhaseMeasurement {
            low: timing.long(),
            high: timing.short(),
        })
        .expect("frame phase buffer overflow");
    let word = (u16::from(address) << 4) | u16::from(data & 0xF);
    for bit in (0..PAYLOAD_SYMBOLS).rev() {
        let one = (word >> bit) & 1 != 0;
        let phase = if one {
            PhaseMeasurement {
                low: timing.long(),
                high: timing.short(),
            }
        } else {
            PhaseMeasurement {
                low: timing.short(),
                high: timing.long(),
            }
        };
        phases.push(phase).expect("frame phase buffer overflow");
    }
    phases
}

/// Synthesizes a full three-frame transmission of the same word.
#[must_use]
pub fn message_phases(address: u8, data: u8, timing: EncoderTiming) -> MessagePhases {
    let mut phases = MessagePhases::new();
    for _ in 0..FRAMES_PER_SET {
        for phase in frame_phases(address, data, timing) {
            phases.push(phase).expect("message phase buffer overflow");
        }
    }
    phases
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMING: EncoderTiming = EncoderTiming::nominal(250_000, 3_000);

    #[test]
    fn nominal_durations_follow_the_oscillator() {
        assert_eq!(TIMING.short(), 83);
        assert_eq!(TIMING.long(), 166);
    }

    #[test]
    fn frames_carry_thirteen_symbols() {
        let phases = frame_phases(0xFF, 0x5, TIMING);
        assert_eq!(phases.len(), usize::from(FRAME_SYMBOLS));
    }

    #[test]
    fn bit_values_select_the_phase_ratio() {
        // Address 0x80, data 0: symbol 1 is a one, the rest zeros.
        let phases = frame_phases(0x80, 0x0, TIMING);
        let msb = phases[1];
        assert_eq!(msb.low, TIMING.long());
        assert_eq!(msb.high, TIMING.short());
        let next = phases[2];
        assert_eq!(next.low, TIMING.short());
        assert_eq!(next.high, TIMING.long());
    }

    #[test]
    fn messages_repeat_the_frame_three_times() {
        let message = message_phases(0xFF, 0xA, TIMING);
        let frame = frame_phases(0xFF, 0xA, TIMING);
        assert_eq!(message.len(), frame.len() * FRAMES_PER_SET);
        for (index, phase) in message.iter().enumerate() {
            assert_eq!(*phase, frame[index % frame.len()]);
        }
    }

    #[test]
    fn skew_scales_both_phases() {
        let skewed = TIMING.skewed(104);
        assert_eq!(skewed.short(), 86);
        assert_eq!(skewed.long(), 172);
    }
}
