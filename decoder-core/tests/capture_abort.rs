use decoder_core::capture::{AbortReason, CaptureEvent, PulseCapture};
use decoder_core::encoding::{EncoderTiming, frame_phases, message_phases};
use decoder_core::frame::FRAME_SYMBOLS;
use decoder_core::timing::ToleranceWindows;
use decoder_core::validate::OutputLatch;

const TIMER_HZ: u32 = 250_000;
const ENCODER_OSC_HZ: u32 = 3_000;
const TIMEOUT_TICKS: u32 = 8;

const TIMING: EncoderTiming = EncoderTiming::nominal(TIMER_HZ, ENCODER_OSC_HZ);

/// Sits outside both accept windows at the reference rates.
const MALFORMED_HIGH: u32 = 120;

fn windows() -> ToleranceWindows {
    ToleranceWindows::derive(TIMER_HZ, ENCODER_OSC_HZ, 5)
}

fn fresh_capture() -> PulseCapture {
    PulseCapture::new(windows(), TIMEOUT_TICKS)
}

#[test]
fn malformed_bit_at_any_position_resets_the_capture() {
    let message = message_phases(0xFF, 0x5, TIMING);

    for corrupt_at in 0..message.len() {
        let mut capture = fresh_capture();
        let mut aborted = false;
        let mut set_ready = false;

        for (index, phase) in message.iter().enumerate() {
            capture.rising_edge(phase.low);
            let high = if index == corrupt_at {
                MALFORMED_HIGH
            } else {
                phase.high
            };
            match capture.falling_edge(high) {
                CaptureEvent::Aborted(reason) => {
                    assert_eq!(reason, AbortReason::MalformedBit);
                    if index == corrupt_at {
                        aborted = true;
                        // The reset is immediate, not deferred to a tick.
                        assert_eq!(capture.frame_index(), 0, "position {corrupt_at}");
                        assert_eq!(capture.symbol_index(), 0, "position {corrupt_at}");
                    }
                }
                CaptureEvent::SetReady => set_ready = true,
                _ => {}
            }
        }

        assert!(aborted, "corruption at {corrupt_at} was not detected");
        assert!(!set_ready, "analysis fired despite corruption at {corrupt_at}");
        assert!(!capture.analysis_pending());
    }
}

#[test]
fn inactivity_after_a_partial_capture_resets_everything() {
    let mut capture = fresh_capture();

    // One full frame plus five symbols of the second.
    for phase in frame_phases(0xFF, 0x5, TIMING) {
        capture.rising_edge(phase.low);
        capture.falling_edge(phase.high);
    }
    let second = frame_phases(0xFF, 0x5, TIMING);
    for phase in second.iter().take(5) {
        capture.rising_edge(phase.low);
        capture.falling_edge(phase.high);
    }
    assert_eq!(capture.frame_index(), 1);
    assert_eq!(capture.symbol_index(), 5);

    // Silence: the threshold tick count passes without a transition.
    let mut latch = OutputLatch::new();
    latch.apply(decoder_core::validate::Verdict::Unanimous { data: 0x5 });
    for _ in 0..TIMEOUT_TICKS {
        assert_eq!(capture.timer_tick(), CaptureEvent::Quiet);
    }
    let event = capture.timer_tick();
    assert_eq!(event, CaptureEvent::Aborted(AbortReason::Inactivity));

    // The runtime maps the abort onto the latch.
    let update = latch.force_invalid();
    assert!(update.valid_changed);
    assert!(!latch.valid());
    assert_eq!(latch.data(), 0x5);

    assert_eq!(capture.frame_index(), 0);
    assert_eq!(capture.symbol_index(), 0);
    assert!(!capture.analysis_pending());
}

#[test]
fn silence_after_a_valid_set_still_drops_the_output() {
    let mut capture = fresh_capture();
    for phase in message_phases(0xFF, 0x5, TIMING) {
        capture.rising_edge(phase.low);
        capture.falling_edge(phase.high);
    }
    assert!(capture.take_ready().is_some());

    // The hold time elapses with no further transmissions.
    let mut fired = 0;
    for _ in 0..(TIMEOUT_TICKS * 4) {
        if capture.timer_tick() == CaptureEvent::Aborted(AbortReason::Inactivity) {
            fired += 1;
        }
    }
    assert_eq!(fired, 1, "the timeout must fire exactly once per silence");
}

#[test]
fn a_fresh_capture_survives_the_full_frame_length() {
    let mut capture = fresh_capture();
    let frame = frame_phases(0xFF, 0x0, TIMING);
    assert_eq!(frame.len(), usize::from(FRAME_SYMBOLS));

    let mut closed = false;
    for phase in frame {
        capture.rising_edge(phase.low);
        if capture.falling_edge(phase.high) == (CaptureEvent::FrameClosed { frame: 0 }) {
            closed = true;
        }
    }
    assert!(closed);
    assert_eq!(capture.frame_index(), 1);
    assert_eq!(capture.symbol_index(), 0);
}
