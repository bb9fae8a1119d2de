use decoder_core::capture::{AbortReason, DecoderEvent};
use decoder_core::io::{NoopPowerController, OutputProjection, PowerController};
use decoder_core::validate::{OutputLatch, SetValidator, Verdict};

use crate::config;
use crate::hw::OutputLine;

use super::{ALERT_ARMED, DECODER_EVENTS};

#[embassy_executor::task]
pub async fn run(
    mut projection: OutputProjection<OutputLine<'static>>,
    mut power: NoopPowerController,
) -> ! {
    let validator = SetValidator::new(config::ACTIVE.expected_address);
    let mut latch = OutputLatch::new();
    let receiver = DECODER_EVENTS.receiver();

    loop {
        let update = match receiver.receive().await {
            DecoderEvent::FrameSetReady(set) => {
                let verdict = validator.validate(&set);
                match verdict {
                    Verdict::Unanimous { data } => {
                        defmt::info!("analysis: valid transmission, data={=u8:b}", data);
                    }
                    Verdict::Mismatch { matching } => {
                        defmt::warn!("analysis: address mismatch, {=u8}/3 frames agreed", matching);
                    }
                }
                latch.apply(verdict)
            }
            DecoderEvent::CaptureAborted(reason) => {
                let update = latch.force_invalid();
                if matches!(reason, AbortReason::Inactivity) {
                    power.enter_low_power();
                }
                update
            }
        };

        let armed = projection.apply(&update);
        if config::ACTIVE.alert_mode {
            if armed {
                ALERT_ARMED.signal(true);
            } else if update.valid_changed && !update.valid {
                ALERT_ARMED.signal(false);
            }
        }
    }
}
