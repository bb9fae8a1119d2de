//! Interactive decode session over simulated hardware.
//!
//! The session owns the exact pipeline the firmware assembles — capture
//! machine, validator, latch, output projection — but wires it to recording
//! pins, a counting power controller, and waveforms synthesized on demand,
//! so every command's effect on the external surface is observable as text.

use decoder_core::capture::{AbortReason, CaptureEvent, DecoderEvent, PulseCapture};
use decoder_core::config::DecoderConfig;
use decoder_core::encoding::{EncoderTiming, message_phases};
use decoder_core::io::{DATA_LINE_COUNT, DigitalLine, OutputProjection, PowerController};
use decoder_core::validate::{OutputLatch, SetValidator, Verdict};

use crate::command::{self, Command, SendArgs};

pub const HELP_TOPICS: &[&str] = &[
    "send [address=<n>] [data=<0-15>] [repeat=<1-8>] [skew=<50-150>]  - transmit a message",
    "noise                         - inject a malformed pulse mid-frame",
    "idle <ticks>                  - run the periodic tick with no edges",
    "status                        - show the latch and pin state",
    "help                          - show this summary",
];

const BASE_CONFIG: DecoderConfig = DecoderConfig {
    expected_address: 0xFF,
    encoder_osc_hz: 3_000,
    tolerance_percent: 5,
    timer_hz: 250_000,
    timeout_ticks: 128,
    alert_mode: false,
    low_power: false,
};

/// Recording pin: remembers its level and counts writes.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimLine {
    level: bool,
    writes: u32,
}

impl DigitalLine for SimLine {
    fn read(&self) -> bool {
        self.level
    }

    fn write(&mut self, high: bool) {
        self.level = high;
        self.writes += 1;
    }
}

/// Counts low-power entry requests instead of sleeping.
#[derive(Copy, Clone, Debug, Default)]
pub struct SimPowerController {
    entries: u32,
}

impl SimPowerController {
    /// Number of times low-power entry was requested.
    #[must_use]
    pub fn entries(&self) -> u32 {
        self.entries
    }
}

impl PowerController for SimPowerController {
    fn enter_low_power(&mut self) {
        self.entries += 1;
    }
}

pub struct Session {
    config: DecoderConfig,
    capture: PulseCapture,
    validator: SetValidator,
    latch: OutputLatch,
    projection: OutputProjection<SimLine>,
    power: SimPowerController,
    timing: EncoderTiming,
    alert_armed: bool,
    commands_handled: usize,
}

impl Session {
    /// Creates a session, optionally overriding the expected address.
    #[must_use]
    pub fn new(address_override: Option<u8>) -> Self {
        let config = DecoderConfig {
            expected_address: address_override.unwrap_or(BASE_CONFIG.expected_address),
            ..BASE_CONFIG
        };
        config.validate().expect("emulator configuration rejected");

        Self {
            config,
            capture: PulseCapture::new(config.windows(), config.timeout_ticks),
            validator: SetValidator::new(config.expected_address),
            latch: OutputLatch::new(),
            projection: OutputProjection::new(
                SimLine::default(),
                [Some(SimLine::default()); DATA_LINE_COUNT],
            ),
            power: SimPowerController::default(),
            timing: EncoderTiming::nominal(config.timer_hz, config.encoder_osc_hz),
            alert_armed: false,
            commands_handled: 0,
        }
    }

    /// Executes one command line and returns the narration.
    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        self.commands_handled += 1;
        match command::parse(line) {
            Ok(Command::Send(args)) => self.handle_send(&args),
            Ok(Command::Noise) => self.handle_noise(),
            Ok(Command::Idle { ticks }) => self.handle_idle(ticks),
            Ok(Command::Status) => self.handle_status(),
            Ok(Command::Help) => HELP_TOPICS.iter().map(ToString::to_string).collect(),
            Err(err) => vec![format!("ERR {err}")],
        }
    }

    fn handle_send(&mut self, args: &SendArgs) -> Vec<String> {
        let address = args.address.unwrap_or(self.config.expected_address);
        let timing = match args.skew_percent {
            Some(percent) => self.timing.skewed(percent),
            None => self.timing,
        };

        let mut lines = Vec::new();
        lines.push(format!(
            "send: address=0x{address:02X} data={data:04b} repeat={repeat}",
            data = args.data,
            repeat = args.repeat
        ));
        for _ in 0..args.repeat {
            for phase in message_phases(address, args.data, timing) {
                let rising = self.capture.rising_edge(phase.low);
                self.pump(rising, &mut lines);
                let falling = self.capture.falling_edge(phase.high);
                self.pump(falling, &mut lines);
            }
        }
        lines
    }

    fn handle_noise(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push("noise: malformed pulse injected".to_string());

        let opened = self.capture.rising_edge(self.timing.long());
        self.pump(opened, &mut lines);
        let start = self.capture.falling_edge(self.timing.short());
        self.pump(start, &mut lines);

        // One more rising edge, then a high phase between the two accept
        // windows.
        let between = (self.timing.short() + self.timing.long()) / 2;
        self.capture.rising_edge(self.timing.long());
        let event = self.capture.falling_edge(between);
        self.pump(event, &mut lines);
        lines
    }

    fn handle_idle(&mut self, ticks: u32) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(format!("idle: advancing {ticks} ticks"));
        for _ in 0..ticks {
            let event = self.capture.timer_tick();
            self.pump(event, &mut lines);
        }
        lines
    }

    fn handle_status(&mut self) -> Vec<String> {
        vec![
            format!("address: 0x{:02X}", self.config.expected_address),
            format!(
                "latch: valid={} data={:04b}",
                self.latch.valid(),
                self.latch.data()
            ),
            format!(
                "pins: VT={} data={}",
                u8::from(self.projection.valid_line().read()),
                self.data_bits()
            ),
            format!(
                "capture: frame={} symbol={} pending={}",
                self.capture.frame_index(),
                self.capture.symbol_index(),
                self.capture.analysis_pending()
            ),
            format!("power: low-power entries={}", self.power.entries()),
            format!("commands handled: {}", self.commands_handled),
        ]
    }

    fn pump(&mut self, event: CaptureEvent, out: &mut Vec<String>) {
        match event {
            CaptureEvent::Quiet | CaptureEvent::BitCaptured { .. } => {}
            CaptureEvent::FrameOpened { frame } => {
                out.push(format!("capture: frame {frame} opened"));
            }
            CaptureEvent::FrameClosed { frame } => {
                out.push(format!("capture: frame {frame} closed"));
            }
            CaptureEvent::SetReady => {
                out.push("capture: frame set ready".to_string());
                if let Some(set) = self.capture.take_ready() {
                    self.analyze(DecoderEvent::FrameSetReady(set), out);
                }
            }
            CaptureEvent::Aborted(reason) => {
                self.analyze(DecoderEvent::CaptureAborted(reason), out);
            }
        }
    }

    fn analyze(&mut self, event: DecoderEvent, out: &mut Vec<String>) {
        let update = match event {
            DecoderEvent::FrameSetReady(set) => {
                let verdict = self.validator.validate(&set);
                match verdict {
                    Verdict::Unanimous { data } => {
                        out.push(format!("analysis: valid transmission, data={data:04b}"));
                    }
                    Verdict::Mismatch { matching } => {
                        out.push(format!(
                            "analysis: address mismatch, {matching}/3 frames agreed"
                        ));
                    }
                }
                self.latch.apply(verdict)
            }
            DecoderEvent::CaptureAborted(reason) => {
                out.push(format!("capture: aborted ({})", abort_label(reason)));
                if matches!(reason, AbortReason::Inactivity) {
                    self.power.enter_low_power();
                    out.push("power: low-power entry requested".to_string());
                }
                self.latch.force_invalid()
            }
        };

        let armed = self.projection.apply(&update);
        if update.valid_changed {
            out.push(format!(
                "output: VT {}",
                if update.valid { "asserted" } else { "deasserted" }
            ));
        }
        if update.data_changed {
            out.push(format!("output: data lines = {}", self.data_bits()));
        }
        if armed {
            self.alert_armed = true;
            out.push("alert: armed".to_string());
        } else if update.valid_changed && !update.valid && self.alert_armed {
            self.alert_armed = false;
            out.push("alert: disarmed".to_string());
        }
    }

    fn data_bits(&self) -> String {
        self.projection
            .data_lines()
            .iter()
            .map(|line| match line {
                Some(line) if line.read() => '1',
                Some(_) => '0',
                None => '-',
            })
            .collect()
    }
}

const fn abort_label(reason: AbortReason) -> &'static str {
    match reason {
        AbortReason::MalformedBit => "malformed-bit",
        AbortReason::Inactivity => "inactivity",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_send_asserts_the_outputs() {
        let mut session = Session::new(None);
        let lines = session.handle_command("send data=5");
        assert!(lines.iter().any(|line| line == "output: VT asserted"));
        assert!(lines.iter().any(|line| line == "output: data lines = 0101"));

        let status = session.handle_command("status");
        assert!(status.contains(&"latch: valid=true data=0101".to_string()));
        assert!(status.contains(&"pins: VT=1 data=0101".to_string()));
    }

    #[test]
    fn identical_repeat_produces_no_new_output_writes() {
        let mut session = Session::new(None);
        session.handle_command("send data=5");
        let vt_writes = session.projection.valid_line().writes;

        let lines = session.handle_command("send data=5");
        assert!(lines.iter().all(|line| !line.starts_with("output:")));
        assert_eq!(session.projection.valid_line().writes, vt_writes);
    }

    #[test]
    fn foreign_address_drops_valid_and_keeps_data() {
        let mut session = Session::new(None);
        session.handle_command("send data=9");

        let lines = session.handle_command("send address=0x0F data=9");
        assert!(lines.iter().any(|line| line == "output: VT deasserted"));

        let status = session.handle_command("status");
        assert!(status.contains(&"latch: valid=false data=1001".to_string()));
        assert!(status.contains(&"pins: VT=0 data=1001".to_string()));
    }

    #[test]
    fn noise_aborts_without_blocking_the_next_decode() {
        let mut session = Session::new(None);
        let lines = session.handle_command("noise");
        assert!(
            lines
                .iter()
                .any(|line| line == "capture: aborted (malformed-bit)")
        );

        let lines = session.handle_command("send data=3");
        assert!(lines.iter().any(|line| line == "output: VT asserted"));
    }

    #[test]
    fn silence_times_out_and_requests_low_power() {
        let mut session = Session::new(None);
        session.handle_command("send data=7");

        let lines = session.handle_command("idle 129");
        assert!(
            lines
                .iter()
                .any(|line| line == "capture: aborted (inactivity)")
        );
        assert!(lines.iter().any(|line| line == "output: VT deasserted"));
        assert_eq!(session.power.entries(), 1);
    }

    #[test]
    fn address_override_changes_the_consensus() {
        let mut session = Session::new(Some(0xA5));
        let lines = session.handle_command("send");
        assert!(lines.iter().any(|line| line == "output: VT asserted"));

        let mut mismatched = Session::new(Some(0xA5));
        let lines = mismatched.handle_command("send address=0xFF data=2");
        assert!(
            lines
                .iter()
                .any(|line| line == "analysis: address mismatch, 0/3 frames agreed")
        );
    }
}
