//! Active decoder configuration and pin map.
//!
//! Pin assignment on the STM32G0B1:
//!
//! | signal        | pin | notes                                   |
//! |---------------|-----|-----------------------------------------|
//! | DIN           | PA0 | encoded bitstream, EXTI0 edge-triggered |
//! | VT            | PA1 | valid-transmission output               |
//! | D8 (data MSB) | PA4 |                                         |
//! | D9            | PA5 | alert toggle when alert mode is set     |
//! | D10           | PA6 |                                         |
//! | D11 (data LSB)| PA7 | surrendered when the low-power mode is set |

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use decoder_core::config::{DecoderConfig, datasheet_timeout_ticks};

/// Phase-measurement tick rate: one tick per microsecond.
pub const TIMER_HZ: u32 = 1_000_000;

/// Period of the inactivity tick, in microseconds.
pub const TICK_PERIOD_US: u32 = 1_000;

/// Oscillator rate of the reference decoder part, used for the datasheet
/// hold-time derivation.
pub const DECODER_OSC_HZ: u32 = 125_000;

/// Configuration compiled into this firmware image.
pub const ACTIVE: DecoderConfig = DecoderConfig {
    expected_address: 0xFF,
    encoder_osc_hz: 3_000,
    tolerance_percent: 5,
    timer_hz: TIMER_HZ,
    timeout_ticks: datasheet_timeout_ticks(DECODER_OSC_HZ, TICK_PERIOD_US),
    alert_mode: false,
    low_power: false,
};
