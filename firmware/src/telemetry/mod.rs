//! Decode event history and logging helpers.
//!
//! A fixed-capacity ring of capture events with timestamps, mirrored to
//! defmt on the target and to stdout on the host so bring-up and the host
//! test suite share one code path.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use decoder_core::capture::{AbortReason, BitValue, CaptureEvent};
use embassy_time::Instant;
use heapless::{HistoryBuf, OldestOrdered};

/// Total number of decode records retained in memory.
pub const DECODE_LOG_CAPACITY: usize = 64;

/// Ring buffer type backing the decode log.
pub type DecodeRing = HistoryBuf<DecodeRecord, DECODE_LOG_CAPACITY>;

/// Capture event stored with its timestamp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodeRecord {
    pub timestamp: Instant,
    pub event: CaptureEvent,
}

/// Records capture events into a ring buffer and mirrors them to the log.
pub struct DecodeLog {
    ring: DecodeRing,
}

impl DecodeLog {
    /// Creates an empty decode log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
        }
    }

    /// Records one capture event and emits the matching log line.
    pub fn record(&mut self, event: CaptureEvent, timestamp: Instant) {
        self.ring.write(DecodeRecord { timestamp, event });
        emit_log(event, timestamp);
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&DecodeRecord> {
        self.ring.recent()
    }

    /// Iterates the stored records in chronological order.
    pub fn oldest_first(&self) -> OldestOrdered<'_, DecodeRecord> {
        self.ring.oldest_ordered()
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// `true` while no records have been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }
}

impl Default for DecodeLog {
    fn default() -> Self {
        Self::new()
    }
}

const fn bit_digit(value: BitValue) -> u8 {
    match value {
        BitValue::Zero => 0,
        BitValue::One => 1,
    }
}

const fn abort_label(reason: AbortReason) -> &'static str {
    match reason {
        AbortReason::MalformedBit => "malformed-bit",
        AbortReason::Inactivity => "inactivity",
    }
}

#[cfg(target_os = "none")]
fn emit_log(event: CaptureEvent, timestamp: Instant) {
    let t = timestamp.as_micros();
    match event {
        CaptureEvent::Quiet => {}
        CaptureEvent::FrameOpened { frame } => {
            defmt::trace!("capture: frame {=u8} opened t={=u64}us", frame, t);
        }
        CaptureEvent::BitCaptured {
            frame,
            symbol,
            value,
        } => defmt::trace!(
            "capture: frame {=u8} symbol {=u8} = {=u8} t={=u64}us",
            frame,
            symbol,
            bit_digit(value),
            t
        ),
        CaptureEvent::FrameClosed { frame } => {
            defmt::debug!("capture: frame {=u8} closed t={=u64}us", frame, t);
        }
        CaptureEvent::SetReady => defmt::info!("capture: frame set ready t={=u64}us", t),
        CaptureEvent::Aborted(reason) => {
            defmt::warn!("capture: aborted ({}) t={=u64}us", abort_label(reason), t);
        }
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(event: CaptureEvent, timestamp: Instant) {
    let t = timestamp.as_micros();
    match event {
        CaptureEvent::Quiet => {}
        CaptureEvent::FrameOpened { frame } => println!("capture: frame {frame} opened t={t}us"),
        CaptureEvent::BitCaptured {
            frame,
            symbol,
            value,
        } => println!(
            "capture: frame {frame} symbol {symbol} = {} t={t}us",
            bit_digit(value)
        ),
        CaptureEvent::FrameClosed { frame } => println!("capture: frame {frame} closed t={t}us"),
        CaptureEvent::SetReady => println!("capture: frame set ready t={t}us"),
        CaptureEvent::Aborted(reason) => {
            println!("capture: aborted ({}) t={t}us", abort_label(reason));
        }
    }
}
