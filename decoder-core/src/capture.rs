//! Edge timing capture, bit classification, and frame assembly.
//!
//! Everything in this module runs in the interrupt (or capture-task) context
//! and is bounded-time: signal edges and periodic ticks mutate the state
//! machine, and a completed three-frame set is parked in a pending slot that
//! the analysis context drains with [`PulseCapture::take_ready`]. While the
//! slot is occupied no new capture opens, so the consumer always observes a
//! quiescent frame set.

use crate::frame::{FRAME_SYMBOLS, FRAMES_PER_SET, Frame, FrameSet};
use crate::io::TimerTicks;
use crate::timing::{Ticks, ToleranceWindows};

/// Decoded value of a single symbol.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BitValue {
    Zero,
    One,
}

/// Outcome of classifying one phase pair.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    Bit(BitValue),
    /// The pair matches neither encoding pattern; the capture aborts.
    Invalid,
}

/// Low- and high-phase durations measured for one symbol.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PhaseMeasurement {
    pub low: Ticks,
    pub high: Ticks,
}

/// Classifies a phase pair against the accept windows.
///
/// The high phase decides which pattern is even considered: a short high can
/// only belong to a one (long low), a long high only to a zero (short low).
/// The windows may overlap at generous tolerances, so the order of these
/// checks is part of the contract.
#[must_use]
pub fn classify(windows: &ToleranceWindows, phases: PhaseMeasurement) -> Classification {
    if windows.short().contains(phases.high) {
        if windows.long().contains(phases.low) {
            return Classification::Bit(BitValue::One);
        }
    } else if windows.long().contains(phases.high) && windows.short().contains(phases.low) {
        return Classification::Bit(BitValue::Zero);
    }
    Classification::Invalid
}

/// Captures the elapsed tick count at each signal edge.
pub struct EdgeTimer<T: TimerTicks> {
    timer: T,
}

impl<T: TimerTicks> EdgeTimer<T> {
    /// Wraps a free-running tick source.
    pub fn new(timer: T) -> Self {
        Self { timer }
    }

    /// Returns the ticks elapsed since the previous edge and restarts the
    /// count for the next phase.
    pub fn capture(&mut self) -> Ticks {
        let elapsed = self.timer.now();
        self.timer.reset();
        elapsed
    }
}

/// Abort cause reported alongside a capture reset.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AbortReason {
    /// A phase pair matched neither encoding window.
    MalformedBit,
    /// No valid transition arrived within the configured timeout.
    Inactivity,
}

/// Step outcome reported by the capture machine, suitable for logging.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CaptureEvent {
    /// Nothing noteworthy happened.
    Quiet,
    /// A start symbol opened the given frame.
    FrameOpened { frame: u8 },
    /// A payload symbol was accepted into the given frame.
    BitCaptured { frame: u8, symbol: u8, value: BitValue },
    /// The thirteenth symbol completed the given frame.
    FrameClosed { frame: u8 },
    /// The third frame completed; a set is parked for analysis.
    SetReady,
    /// The capture machine reset itself.
    Aborted(AbortReason),
}

/// Handoff value moved from the capture context to the analysis context.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecoderEvent {
    /// A quiescent frame set is ready for validation.
    FrameSetReady(FrameSet),
    /// The capture aborted; the valid output must be deasserted.
    CaptureAborted(AbortReason),
}

/// The interrupt-context decode state machine.
///
/// Exactly one writer (the edge/tick context) advances the capture; the
/// analysis context only observes [`analysis_pending`](Self::analysis_pending)
/// and drains [`take_ready`](Self::take_ready). No field is written from
/// both contexts in the same pass, which is what makes the handoff safe
/// without a lock.
pub struct PulseCapture {
    windows: ToleranceWindows,
    timeout_ticks: u32,
    frames: [Frame; FRAMES_PER_SET],
    frame_index: u8,
    symbol_index: u8,
    low_phase: Ticks,
    frame_open: bool,
    inactivity: u32,
    pending: Option<FrameSet>,
}

impl PulseCapture {
    /// Creates an idle capture machine.
    #[must_use]
    pub const fn new(windows: ToleranceWindows, timeout_ticks: u32) -> Self {
        Self {
            windows,
            timeout_ticks,
            frames: [Frame::EMPTY; FRAMES_PER_SET],
            frame_index: 0,
            symbol_index: 0,
            low_phase: 0,
            frame_open: false,
            inactivity: 0,
            pending: None,
        }
    }

    /// Handles a rising edge; `elapsed` is the low-phase duration measured
    /// since the previous falling edge.
    pub fn rising_edge(&mut self, elapsed: Ticks) -> CaptureEvent {
        if self.pending.is_some() {
            // Quiescence gate: the parked set must be drained before any
            // frame state may change again.
            return CaptureEvent::Quiet;
        }
        if self.frame_open {
            self.low_phase = elapsed;
            return CaptureEvent::Quiet;
        }
        // Start symbol. The preceding low time is the idle gap and carries
        // no information, so classification of this symbol rests on the
        // high phase alone.
        self.frames[self.frame_index as usize] = Frame::EMPTY;
        self.low_phase = self.windows.start_low_sentinel();
        self.symbol_index = 0;
        self.frame_open = true;
        self.inactivity = 0;
        CaptureEvent::FrameOpened {
            frame: self.frame_index,
        }
    }

    /// Handles a falling edge; `elapsed` is the high-phase duration measured
    /// since the previous rising edge.
    ///
    /// The falling edge is the decision point: both phases of the symbol are
    /// known here, so this is where bits are accepted or the capture aborts.
    pub fn falling_edge(&mut self, elapsed: Ticks) -> CaptureEvent {
        if self.pending.is_some() || !self.frame_open {
            return CaptureEvent::Quiet;
        }
        let phases = PhaseMeasurement {
            low: self.low_phase,
            high: elapsed,
        };
        match classify(&self.windows, phases) {
            Classification::Bit(value) => self.accept(value),
            Classification::Invalid => {
                self.reset();
                CaptureEvent::Aborted(AbortReason::MalformedBit)
            }
        }
    }

    /// Handles one periodic timer tick, driving the inactivity timeout.
    ///
    /// The first crossing of the threshold aborts the capture; the counter
    /// then saturates so an idle line does not re-fire until the next frame
    /// opens.
    pub fn timer_tick(&mut self) -> CaptureEvent {
        if self.inactivity > self.timeout_ticks {
            return CaptureEvent::Quiet;
        }
        self.inactivity += 1;
        if self.inactivity > self.timeout_ticks {
            self.reset();
            CaptureEvent::Aborted(AbortReason::Inactivity)
        } else {
            CaptureEvent::Quiet
        }
    }

    /// `true` while a completed set awaits analysis.
    #[must_use]
    pub const fn analysis_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Moves the parked frame set out, releasing the capture machine for the
    /// next transmission.
    pub fn take_ready(&mut self) -> Option<FrameSet> {
        self.pending.take()
    }

    /// Index of the frame currently being captured.
    #[must_use]
    pub const fn frame_index(&self) -> u8 {
        self.frame_index
    }

    /// Index of the symbol expected next within the current frame.
    #[must_use]
    pub const fn symbol_index(&self) -> u8 {
        self.symbol_index
    }

    fn accept(&mut self, value: BitValue) -> CaptureEvent {
        let frame = self.frame_index;
        let symbol = self.symbol_index;
        if matches!(value, BitValue::One) {
            self.frames[frame as usize].mark_one(symbol);
        }
        self.inactivity = 0;
        if symbol == FRAME_SYMBOLS - 1 {
            self.frame_open = false;
            self.symbol_index = 0;
            self.frame_index += 1;
            if self.frame_index as usize == FRAMES_PER_SET {
                // Indices reset before the pending slot becomes observable,
                // so the consumer never sees a half-advanced machine.
                self.frame_index = 0;
                self.pending = Some(FrameSet::new(self.frames));
                CaptureEvent::SetReady
            } else {
                CaptureEvent::FrameClosed { frame }
            }
        } else {
            self.symbol_index += 1;
            CaptureEvent::BitCaptured {
                frame,
                symbol,
                value,
            }
        }
    }

    fn reset(&mut self) {
        self.frames = [Frame::EMPTY; FRAMES_PER_SET];
        self.frame_index = 0;
        self.symbol_index = 0;
        self.low_phase = 0;
        self.frame_open = false;
        self.pending = None;
        // Park the counter past the threshold so silence after an abort
        // cannot fire a second timeout; the next start symbol clears it.
        self.inactivity = self.timeout_ticks.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: u32 = 128;

    fn windows() -> ToleranceWindows {
        // 83-tick short nominal, 166-tick long nominal.
        ToleranceWindows::derive(250_000, 3_000, 5)
    }

    fn phases(low: Ticks, high: Ticks) -> PhaseMeasurement {
        PhaseMeasurement { low, high }
    }

    #[test]
    fn short_high_with_long_low_is_a_one() {
        assert_eq!(
            classify(&windows(), phases(166, 83)),
            Classification::Bit(BitValue::One)
        );
    }

    #[test]
    fn long_high_with_short_low_is_a_zero() {
        assert_eq!(
            classify(&windows(), phases(83, 166)),
            Classification::Bit(BitValue::Zero)
        );
    }

    #[test]
    fn mismatched_pairs_are_invalid() {
        let windows = windows();
        // High phase outside both windows.
        assert_eq!(classify(&windows, phases(166, 120)), Classification::Invalid);
        // Short high but the low phase matches neither window.
        assert_eq!(classify(&windows, phases(120, 83)), Classification::Invalid);
        // Long high but the low phase is also long.
        assert_eq!(classify(&windows, phases(166, 166)), Classification::Invalid);
        // Both phases short.
        assert_eq!(classify(&windows, phases(83, 83)), Classification::Invalid);
    }

    #[test]
    fn window_bounds_reject_on_the_edge() {
        let w = windows();
        assert_eq!(
            classify(&w, phases(166, w.short().max)),
            Classification::Invalid
        );
        assert_eq!(
            classify(&w, phases(w.long().min, 83)),
            Classification::Invalid
        );
    }

    #[test]
    fn start_symbol_rides_on_the_sentinel() {
        let mut capture = PulseCapture::new(windows(), TIMEOUT);
        assert_eq!(capture.rising_edge(9_999), CaptureEvent::FrameOpened { frame: 0 });
        // Short high closes the start symbol even though the measured low
        // phase (the idle gap) was nowhere near a window.
        assert_eq!(
            capture.falling_edge(83),
            CaptureEvent::BitCaptured {
                frame: 0,
                symbol: 0,
                value: BitValue::One,
            }
        );
        assert_eq!(capture.symbol_index(), 1);
    }

    #[test]
    fn malformed_bit_resets_immediately() {
        let mut capture = PulseCapture::new(windows(), TIMEOUT);
        capture.rising_edge(0);
        capture.falling_edge(83);
        capture.rising_edge(166);
        assert_eq!(
            capture.falling_edge(120),
            CaptureEvent::Aborted(AbortReason::MalformedBit)
        );
        assert_eq!(capture.frame_index(), 0);
        assert_eq!(capture.symbol_index(), 0);
        assert!(!capture.analysis_pending());
    }

    #[test]
    fn inactivity_fires_once_then_saturates() {
        let mut capture = PulseCapture::new(windows(), 3);
        capture.rising_edge(0);
        capture.falling_edge(83);

        assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
        assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
        assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
        assert_eq!(
            capture.timer_tick(),
            CaptureEvent::Aborted(AbortReason::Inactivity)
        );
        for _ in 0..16 {
            assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
        }
    }

    #[test]
    fn accepted_bits_hold_the_timeout_off() {
        let mut capture = PulseCapture::new(windows(), 2);
        capture.rising_edge(0);
        capture.falling_edge(83);
        for _ in 0..2 {
            assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
        }
        // Another valid symbol clears the counter before it can expire.
        capture.rising_edge(166);
        capture.falling_edge(83);
        for _ in 0..2 {
            assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
        }
    }

    fn feed_all_ones_frame(capture: &mut PulseCapture) {
        capture.rising_edge(9_999);
        capture.falling_edge(83);
        for _ in 0..crate::frame::PAYLOAD_SYMBOLS {
            capture.rising_edge(166);
            capture.falling_edge(83);
        }
    }

    #[test]
    fn pending_slot_gates_new_captures() {
        let mut capture = PulseCapture::new(windows(), TIMEOUT);
        for _ in 0..FRAMES_PER_SET {
            feed_all_ones_frame(&mut capture);
        }
        assert!(capture.analysis_pending());

        // Edges bounce off until the set is drained.
        assert_eq!(capture.rising_edge(0), CaptureEvent::Quiet);
        assert_eq!(capture.falling_edge(83), CaptureEvent::Quiet);

        let set = capture.take_ready().expect("set should be parked");
        assert_eq!(set.frames()[0].address(), 0xFF);
        assert_eq!(set.frames()[0].data(), 0xF);
        assert_eq!(capture.rising_edge(0), CaptureEvent::FrameOpened { frame: 0 });
    }
}
