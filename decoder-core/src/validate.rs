//! Frame-set validation and the externally visible output latch.
//!
//! Runs outside the capture context. A drained [`FrameSet`] is checked for
//! unanimous address agreement; the latch folds the verdict into the `valid`
//! flag and the retained data nibble and reports what actually changed, so
//! downstream pin writes stay edge-triggered.

use crate::frame::{FRAMES_PER_SET, FrameSet};

/// Result of checking address agreement across a frame set.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// Every frame carried the expected address; `data` is the carried nibble.
    Unanimous { data: u8 },
    /// Fewer than three frames matched the expected address.
    Mismatch { matching: u8 },
}

/// Checks captured frame sets against the configured address.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SetValidator {
    expected_address: u8,
}

impl SetValidator {
    /// Creates a validator for the given address.
    #[must_use]
    pub const fn new(expected_address: u8) -> Self {
        Self { expected_address }
    }

    /// Applies the three-frame consensus rule.
    #[must_use]
    pub fn validate(&self, set: &FrameSet) -> Verdict {
        let mut matching: u8 = 0;
        let mut data: u8 = 0;
        for frame in set.frames() {
            if frame.address() == self.expected_address {
                matching += 1;
                data = frame.data();
            }
        }
        if matching as usize == FRAMES_PER_SET {
            Verdict::Unanimous { data }
        } else {
            Verdict::Mismatch { matching }
        }
    }
}

/// Externally visible decode status: the valid flag plus the latched nibble.
///
/// The data value is retained across mismatches and timeouts; only the valid
/// flag drops.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputLatch {
    valid: bool,
    data: u8,
}

/// Edge-triggered view of one latch update.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LatchUpdate {
    pub valid: bool,
    pub valid_changed: bool,
    pub data: u8,
    pub data_changed: bool,
}

impl OutputLatch {
    /// Creates a latch in the power-on state: invalid, data zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            valid: false,
            data: 0,
        }
    }

    /// Folds a validation verdict into the latch.
    pub fn apply(&mut self, verdict: Verdict) -> LatchUpdate {
        match verdict {
            Verdict::Unanimous { data } => {
                let data_changed = data != self.data;
                let valid_changed = !self.valid;
                self.valid = true;
                self.data = data;
                LatchUpdate {
                    valid: true,
                    valid_changed,
                    data,
                    data_changed,
                }
            }
            Verdict::Mismatch { .. } => self.force_invalid(),
        }
    }

    /// Drops the valid flag without touching the latched data. Used for the
    /// mismatch and timeout paths.
    pub fn force_invalid(&mut self) -> LatchUpdate {
        let valid_changed = self.valid;
        self.valid = false;
        LatchUpdate {
            valid: false,
            valid_changed,
            data: self.data,
            data_changed: false,
        }
    }

    /// Current valid flag.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.valid
    }

    /// Most recently latched data nibble.
    #[must_use]
    pub const fn data(&self) -> u8 {
        self.data
    }
}

impl Default for OutputLatch {
    fn default() -> Self {
        Self::new()
    }
}
