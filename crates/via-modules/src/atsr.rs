//! ATSR envelope module.
//!
//! Drives one [`Envelope`] per tick and writes:
//!
//! | Output | Signal |
//! |--------|--------|
//! | DAC1 | envelope level A |
//! | DAC2 | level B, the inverted envelope |
//! | DAC3 | loop gate (attack/transition active), calibrated |
//! | logic A | high while sustaining |
//! | aux logic | gate delayed by [`GATE_DELAY`] ticks |
//! | S&H A/B | engaged while the level is nonzero and S&H is on |
//!
//! On the hardware target each call fills a block of DAC samples, spreading
//! the 4 bits dropped from the 16-bit level over an 8-step dither pattern.
//! The virtual target writes one undithered sample per call on the same
//! 12-bit scale.

use via_dsp::{LilBuffer, saturate_unsigned};

use crate::calibration::Calibration;
use crate::envelope::{Envelope, EnvelopeKnobs, LEVEL_MAX, Rates, Slope, Stage};
use crate::io::{ControlInputs, Outputs, RenderTarget, led};
use crate::render::Render;

/// Ticks the aux logic output lags the gate.
pub const GATE_DELAY: usize = 7;

/// Ticks the loop gate is held high after it falls while the gate is on.
const LOOP_GATE_HOLD: i32 = 8;

/// Envelope voice state.
#[derive(Debug, Clone)]
pub struct AtsrModule {
    envelope: Envelope,
    /// Front-panel settings.
    pub knobs: EnvelopeKnobs,
    /// Sample-and-hold outputs follow the levels.
    pub sh_on: bool,
    target: RenderTarget,
    calibration: Calibration,
    last_gate: bool,
    last_loop: bool,
    gate_low_countdown: i32,
    startup: bool,
    pwm_counter: i32,
    gate_history: LilBuffer,
}

impl AtsrModule {
    /// Envelope module at rest.
    pub fn new(
        knobs: EnvelopeKnobs,
        slope: Slope,
        looping: bool,
        target: RenderTarget,
        calibration: Calibration,
    ) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(?slope, looping, ?target, "atsr module initialized");

        Self {
            envelope: Envelope::new(slope, looping),
            knobs,
            sh_on: false,
            target,
            calibration,
            last_gate: false,
            last_loop: false,
            gate_low_countdown: 0,
            startup: true,
            pwm_counter: 0,
            gate_history: LilBuffer::new(),
        }
    }

    /// Render target this module writes for.
    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// The envelope state machine.
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Edge detection, gate delay and loop-gate hold countdown.
    fn process_gate(&mut self, inputs: &ControlInputs) {
        let rising = inputs.gate && !self.last_gate;
        let falling = !inputs.gate && self.last_gate;
        if rising || inputs.trigger {
            self.envelope.gate_on();
            self.startup = false;
        } else if falling {
            self.envelope.gate_off();
        }
        self.last_gate = inputs.gate;
        self.gate_history.write(i32::from(inputs.gate));
        self.gate_low_countdown = (self.gate_low_countdown - 1).max(0);
    }
}

impl Render for AtsrModule {
    fn render(&mut self, write_position: usize, inputs: &ControlInputs, outputs: &mut Outputs) {
        let inputs = self.calibration.apply(inputs);
        self.process_gate(&inputs);

        let rates = Rates::from_controls(&self.knobs, &inputs);
        let a_full = self.envelope.step(&rates, inputs.gate);
        let b_full = LEVEL_MAX - a_full;
        let a_pulse_width = (a_full & 15) >> 1;
        let b_pulse_width = (b_full & 15) >> 1;
        let a_level = a_full >> 4;
        let b_level = b_full >> 4;

        let stage = self.envelope.stage();
        let mut loop_gate = stage.is_cycling();
        if self.last_loop && !loop_gate && inputs.gate {
            self.gate_low_countdown += LOOP_GATE_HOLD;
        }
        self.last_loop = loop_gate;
        loop_gate |= self.gate_low_countdown > 0;
        loop_gate &= !self.startup;
        let dac3 = saturate_unsigned(
            (2048 - self.calibration.dac3_offset) - i32::from(loop_gate) * 2048,
            12,
        );

        outputs.logic_a = stage == Stage::Sustain;
        outputs.aux_logic = self.gate_history.read(GATE_DELAY) != 0;
        outputs.sh_a = a_level != 0 && self.sh_on;
        outputs.sh_b = b_level != 0 && self.sh_on;

        self.pwm_counter = (self.pwm_counter + 1) & 255;
        outputs.leds[led::A] = self.pwm_counter < (a_level >> 4) || self.sh_on;
        outputs.leds[led::B] = self.pwm_counter < (b_level >> 4) || self.sh_on;
        outputs.leds[led::C] = outputs.logic_a;
        outputs.leds[led::D] = loop_gate;

        let n = self.target.samples_per_call();
        let end = write_position + n;
        match self.target {
            RenderTarget::Hardware { .. } => {
                let blocks = outputs.dac1[write_position..end]
                    .iter_mut()
                    .zip(&mut outputs.dac2[write_position..end])
                    .zip(&mut outputs.dac3[write_position..end]);
                for (dither, ((dac1, dac2), out3)) in blocks.enumerate() {
                    let dither = (dither & 7) as i32;
                    *dac1 = saturate_unsigned(a_level + i32::from(dither < a_pulse_width), 12);
                    *dac2 = saturate_unsigned(b_level + i32::from(dither < b_pulse_width), 12);
                    *out3 = dac3;
                }
            }
            RenderTarget::Virtual => {
                // 12-bit codes like the hardware path, not the 15-bit scale
                outputs.dac1[write_position] = saturate_unsigned(a_level, 12);
                outputs.dac2[write_position] = saturate_unsigned(b_level, 12);
                outputs.dac3[write_position] = dac3;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_knobs() -> EnvelopeKnobs {
        EnvelopeKnobs {
            attack: 0,
            transition: 0,
            sustain: 2048,
            release: 0,
        }
    }

    fn gate(on: bool) -> ControlInputs {
        ControlInputs {
            gate: on,
            ..ControlInputs::default()
        }
    }

    #[test]
    fn virtual_target_writes_one_sample() {
        let mut module = AtsrModule::new(
            fast_knobs(),
            Slope::Linear,
            false,
            RenderTarget::Virtual,
            Calibration::default(),
        );
        let mut out = Outputs::new(4);
        out.dac1 = vec![-1; 4];
        module.render(2, &gate(true), &mut out);
        assert_eq!(out.dac1[..2], [-1, -1]);
        assert_eq!(out.dac1[3], -1);
        assert!((0..4096).contains(&out.dac1[2]));
    }

    #[test]
    fn envelope_reaches_sustain_on_dac1() {
        let mut module = AtsrModule::new(
            fast_knobs(),
            Slope::Linear,
            false,
            RenderTarget::Virtual,
            Calibration::default(),
        );
        let mut out = Outputs::new(1);
        for _ in 0..200 {
            module.render(0, &gate(true), &mut out);
        }
        assert_eq!(module.envelope().stage(), Stage::Sustain);
        assert_eq!(out.dac1[0], 2048);
        assert_eq!(out.dac2[0], (LEVEL_MAX - (2048 << 4)) >> 4);
        assert!(out.logic_a);
        assert!(out.leds[led::C]);
    }

    #[test]
    fn loop_gate_on_dac3() {
        let mut module = AtsrModule::new(
            fast_knobs(),
            Slope::Linear,
            false,
            RenderTarget::Virtual,
            Calibration::default(),
        );
        let mut out = Outputs::new(1);
        // startup masks the loop gate until the first gate
        module.render(0, &ControlInputs::default(), &mut out);
        assert_eq!(out.dac3[0], 2048);
        module.render(0, &gate(true), &mut out);
        assert_eq!(out.dac3[0], 0);
        assert!(out.leds[led::D]);
    }

    #[test]
    fn loop_gate_held_after_transition() {
        let mut module = AtsrModule::new(
            fast_knobs(),
            Slope::Linear,
            false,
            RenderTarget::Virtual,
            Calibration::default(),
        );
        let mut out = Outputs::new(1);
        let mut high = Vec::new();
        for _ in 0..200 {
            module.render(0, &gate(true), &mut out);
            high.push(out.leds[led::D]);
        }
        let last_cycling = high.iter().rposition(|&h| h).unwrap();
        // attack + transition take 128 ticks at the fastest rate
        assert!(last_cycling >= 128 && last_cycling < 128 + 10, "{last_cycling}");
    }

    #[test]
    fn dac3_calibration_offset() {
        let calibration = Calibration {
            dac3_offset: 12,
            ..Calibration::default()
        };
        let mut module =
            AtsrModule::new(fast_knobs(), Slope::Linear, false, RenderTarget::Virtual, calibration);
        let mut out = Outputs::new(1);
        module.render(0, &ControlInputs::default(), &mut out);
        assert_eq!(out.dac3[0], 2036);
    }

    #[test]
    fn hardware_block_dithers_within_one_lsb() {
        let target = RenderTarget::Hardware { block_size: 16 };
        let knobs = EnvelopeKnobs {
            attack: 3000,
            ..fast_knobs()
        };
        let mut module =
            AtsrModule::new(knobs, Slope::Sigmoid, false, target, Calibration::default());
        let mut out = Outputs::new(48);
        out.dac1.fill(-1);
        for _ in 0..300 {
            module.render(16, &gate(true), &mut out);
            let level = module.envelope().level() >> 4;
            for &s in &out.dac1[16..32] {
                assert!(s == level || s == level + 1, "{s} vs {level}");
            }
            assert!(out.dac3[16..32].iter().all(|&s| s == out.dac3[16]));
        }
        assert!(out.dac1[..16].iter().all(|&s| s == -1));
        assert!(out.dac1[32..].iter().all(|&s| s == -1));
    }

    #[test]
    fn dither_average_tracks_fractional_level() {
        let target = RenderTarget::Hardware { block_size: 8 };
        let knobs = EnvelopeKnobs {
            attack: 3500,
            ..fast_knobs()
        };
        let mut module = AtsrModule::new(knobs, Slope::Linear, false, target, Calibration::default());
        let mut out = Outputs::new(8);
        for _ in 0..50 {
            module.render(0, &gate(true), &mut out);
        }
        let level = module.envelope().level();
        let sum: i32 = out.dac1.iter().sum();
        assert_eq!(sum, (level >> 4) * 8 + ((level & 15) >> 1));
    }

    #[test]
    fn aux_logic_is_delayed_gate() {
        let mut module = AtsrModule::new(
            fast_knobs(),
            Slope::Linear,
            false,
            RenderTarget::Virtual,
            Calibration::default(),
        );
        let mut out = Outputs::new(1);
        let mut seen = Vec::new();
        for tick in 0..12 {
            module.render(0, &gate(tick >= 2), &mut out);
            seen.push(out.aux_logic);
        }
        assert_eq!(seen.iter().position(|&g| g), Some(2 + GATE_DELAY));
    }

    #[test]
    fn sample_and_hold_follows_levels() {
        let mut module = AtsrModule::new(
            fast_knobs(),
            Slope::Linear,
            false,
            RenderTarget::Virtual,
            Calibration::default(),
        );
        module.sh_on = true;
        let mut out = Outputs::new(1);
        module.render(0, &ControlInputs::default(), &mut out);
        assert!(!out.sh_a);
        assert!(out.sh_b);
        assert!(out.leds[led::A] && out.leds[led::B]);
    }
}
