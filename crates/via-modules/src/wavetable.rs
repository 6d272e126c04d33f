//! Wavetable voice module.
//!
//! A [`PhaseOscillator`] plays a quintic-spline family:
//!
//! | Input | Effect |
//! |-------|--------|
//! | CV1 | pitch, 384 steps per octave on top of the pitch knob |
//! | CV2 | phase modulation, smoothed over the last 32 ticks |
//! | CV3 | morph offset on top of the morph knob |
//! | trigger | phase reset |
//! | clock | phase-locked playback, one cycle per clock period |
//!
//! DAC1 carries the sample, DAC2 its inversion and DAC3 either the raw phase
//! or a triangle contour derived from it. Logic A follows the slope sign of
//! the spline, so it toggles at the waveform's turning points.

use via_dsp::{
    Buffer, ExpoConverter, PhaseOscillator, TableError, WavetableFamily, fold16, saturate_unsigned,
};

use crate::calibration::Calibration;
use crate::io::{ControlInputs, Outputs, RenderTarget, led};
use crate::render::Render;

/// Phase increment before the first pitch update.
pub const INITIAL_INCREMENT: i32 = 10_000;

/// Left shift from the smoothed bipolar 12-bit CV2 to phase units:
/// full-scale CV2 moves the phase by half a cycle.
const PM_SHIFT: u32 = 19;

/// What DAC3 outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dac3Mode {
    /// Rising ramp: the top 12 bits of the phase.
    #[default]
    Phasor,
    /// Triangle folded from the phase.
    Contour,
}

impl Dac3Mode {
    /// DAC3 code for `phase` before calibration.
    #[inline]
    pub fn code(self, phase: u32) -> i32 {
        match self {
            Self::Phasor => (phase >> 20) as i32,
            Self::Contour => fold16((phase >> 15) as i32) >> 4,
        }
    }
}

/// Front-panel settings, 12-bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavetableKnobs {
    /// Base pitch as an expo table index.
    pub pitch: i32,
    /// Morph position across the family.
    pub morph: i32,
}

impl Default for WavetableKnobs {
    fn default() -> Self {
        Self {
            pitch: 2048,
            morph: 0,
        }
    }
}

/// Clock-lock bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
struct ClockLock {
    locked: bool,
    ticks_since_clock: u32,
    beat_index: i32,
}

/// Wavetable voice state.
#[derive(Debug, Clone)]
pub struct WavetableModule<'a> {
    oscillator: PhaseOscillator<'a>,
    family: WavetableFamily<'a>,
    /// Front-panel settings.
    pub knobs: WavetableKnobs,
    /// DAC3 signal.
    pub dac3_mode: Dac3Mode,
    /// Lock playback to the clock input once a clock period is known.
    pub sync_to_clock: bool,
    target: RenderTarget,
    calibration: Calibration,
    cv2_history: Buffer,
    clock: ClockLock,
    pwm_counter: i32,
}

impl<'a> WavetableModule<'a> {
    /// Voice over `family`. The family's cycle length must be a power of two.
    pub fn new(
        family: WavetableFamily<'a>,
        knobs: WavetableKnobs,
        dac3_mode: Dac3Mode,
        target: RenderTarget,
        calibration: Calibration,
    ) -> Result<Self, TableError> {
        let mut oscillator = PhaseOscillator::spline(family)?;
        oscillator.frequency = INITIAL_INCREMENT;
        let mut cv2_history = Buffer::new();
        cv2_history.fill(0);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            tables = family.table_count(),
            cycle_len = family.cycle_len(),
            ?dac3_mode,
            ?target,
            "wavetable module initialized"
        );

        Ok(Self {
            oscillator,
            family,
            knobs,
            dac3_mode,
            sync_to_clock: false,
            target,
            calibration,
            cv2_history,
            clock: ClockLock::default(),
            pwm_counter: 0,
        })
    }

    /// Render target this module writes for.
    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// The oscillator.
    pub fn oscillator(&self) -> &PhaseOscillator<'a> {
        &self.oscillator
    }

    /// True once playback follows the clock.
    pub fn is_locked(&self) -> bool {
        self.clock.locked
    }

    /// Morph knob plus CV3, scaled onto the family.
    fn morph(&self, cv3: i32) -> u32 {
        let position = saturate_unsigned(self.knobs.morph.wrapping_add(cv3), 12) as u64;
        ((position * u64::from(self.family.max_morph())) >> 12) as u32
    }

    /// Clock edges measure the period and restart the beat count.
    fn process_clock(&mut self, clock: bool, ticks: u32) {
        self.clock.ticks_since_clock = self.clock.ticks_since_clock.saturating_add(ticks);
        if clock && self.sync_to_clock {
            let period = self.clock.ticks_since_clock.max(1);
            self.oscillator.frequency = (u32::MAX / period) as i32;
            self.clock.ticks_since_clock = 0;
            self.clock.beat_index = 0;
            self.clock.locked = true;
        } else if !self.sync_to_clock {
            self.clock.locked = false;
        }
    }

    #[inline]
    fn next_sample(&mut self) -> i32 {
        if self.clock.locked {
            self.clock.beat_index = self.clock.beat_index.wrapping_add(1);
            self.oscillator.step_beat(self.clock.beat_index)
        } else {
            self.oscillator.step()
        }
    }
}

impl Render for WavetableModule<'_> {
    fn render(&mut self, write_position: usize, inputs: &ControlInputs, outputs: &mut Outputs) {
        let inputs = self.calibration.apply(inputs);
        let n = self.target.samples_per_call();

        if inputs.trigger {
            self.oscillator.reset_phase();
            self.clock.beat_index = 0;
        }
        self.process_clock(inputs.clock, n as u32);

        self.cv2_history.write(inputs.cv2);
        let smoothed = self.cv2_history.sum() >> 5;
        self.oscillator.update_phase_modulation(smoothed << PM_SHIFT);

        if !self.clock.locked {
            let index = saturate_unsigned(self.knobs.pitch.wrapping_add(inputs.cv1), 12);
            self.oscillator.frequency = ExpoConverter.convert(index as u32) as i32;
        }
        self.oscillator.morph = self.morph(inputs.cv3);

        let end = write_position + n;
        let dithered = matches!(self.target, RenderTarget::Hardware { .. });
        let mut dac1_last = 0;
        for i in write_position..end {
            let sample = self.next_sample();
            if i == write_position {
                // the modulation nudge applies once per call
                self.oscillator.phase_modulation = 0;
            }
            // the low three bits become a pulse width across each 8 samples
            let dither = dithered && (sample & 7) > ((i - write_position) & 7) as i32;
            let dac1 = saturate_unsigned((sample >> 3) + i32::from(dither), 12);
            outputs.dac1[i] = dac1;
            outputs.dac2[i] = 4095 - dac1;
            let code = self.dac3_mode.code(self.oscillator.phase);
            outputs.dac3[i] = saturate_unsigned(code - self.calibration.dac3_offset, 12);
            dac1_last = dac1;
        }

        outputs.logic_a = self.oscillator.delta != 0;
        outputs.aux_logic = inputs.trigger;
        outputs.sh_a = false;
        outputs.sh_b = false;

        self.pwm_counter = (self.pwm_counter + 1) & 255;
        outputs.leds[led::A] = self.pwm_counter < (dac1_last >> 4);
        outputs.leds[led::B] = self.pwm_counter < ((4095 - dac1_last) >> 4);
        outputs.leds[led::C] = outputs.logic_a;
        outputs.leds[led::D] = self.clock.locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{FamilyShape, OwnedFamily};

    fn voice<'a>(owned: &'a OwnedFamily, target: RenderTarget) -> WavetableModule<'a> {
        WavetableModule::new(
            owned.family().unwrap(),
            WavetableKnobs::default(),
            Dac3Mode::Phasor,
            target,
            Calibration::default(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_power_of_two_cycles() {
        let owned = OwnedFamily::synthesize(FamilyShape::Harmonic, 2, 100).unwrap();
        let err = WavetableModule::new(
            owned.family().unwrap(),
            WavetableKnobs::default(),
            Dac3Mode::Phasor,
            RenderTarget::Virtual,
            Calibration::default(),
        )
        .unwrap_err();
        assert_eq!(err, TableError::CycleNotPowerOfTwo(100));
    }

    #[test]
    fn dac2_is_inverted_dac1() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Hardware { block_size: 32 });
        let mut out = Outputs::new(32);
        for _ in 0..10 {
            module.render(0, &ControlInputs::default(), &mut out);
            for i in 0..32 {
                assert!((0..4096).contains(&out.dac1[i]));
                assert_eq!(out.dac1[i] + out.dac2[i], 4095);
            }
        }
    }

    #[test]
    fn pitch_follows_expo_table() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Virtual);
        let mut out = Outputs::new(1);
        module.render(0, &ControlInputs::default(), &mut out);
        let base = module.oscillator().frequency;
        let up_an_octave = ControlInputs {
            cv1: 384,
            ..ControlInputs::default()
        };
        module.render(0, &up_an_octave, &mut out);
        assert!((module.oscillator().frequency - base * 2).abs() <= 1);
    }

    #[test]
    fn cv3_sweeps_morph() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Virtual);
        let mut out = Outputs::new(1);
        module.render(0, &ControlInputs::default(), &mut out);
        assert_eq!(module.oscillator().morph, 0);
        let full = ControlInputs {
            cv3: 2047,
            ..ControlInputs::default()
        };
        module.knobs.morph = 2048;
        module.render(0, &full, &mut out);
        assert_eq!(module.oscillator().morph, (4095 * (8 << 16)) >> 12);
    }

    #[test]
    fn cv2_is_smoothed_into_phase_modulation() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Virtual);
        module.knobs.pitch = 0;
        let mut out = Outputs::new(1);
        let step = ControlInputs {
            cv2: 320,
            ..ControlInputs::default()
        };
        module.render(0, &step, &mut out);
        // one of 32 history slots moved: 320 / 32 = 10
        assert_eq!(module.oscillator().last_phase_modulation, 10 << 19);
        module.render(0, &step, &mut out);
        assert_eq!(module.oscillator().last_phase_modulation, 20 << 19);
    }

    #[test]
    fn trigger_resets_phase() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Virtual);
        let mut out = Outputs::new(1);
        for _ in 0..100 {
            module.render(0, &ControlInputs::default(), &mut out);
        }
        let trigger = ControlInputs {
            trigger: true,
            ..ControlInputs::default()
        };
        module.render(0, &trigger, &mut out);
        assert_eq!(module.oscillator().phase, module.oscillator().frequency as u32);
        assert!(out.aux_logic);
    }

    #[test]
    fn clock_locks_one_cycle_per_period() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Virtual);
        module.sync_to_clock = true;
        let mut out = Outputs::new(1);
        let clock = ControlInputs {
            clock: true,
            ..ControlInputs::default()
        };
        module.render(0, &clock, &mut out);
        for _ in 0..99 {
            module.render(0, &ControlInputs::default(), &mut out);
        }
        module.render(0, &clock, &mut out);
        assert!(module.is_locked());
        assert_eq!(module.oscillator().frequency, (u32::MAX / 100) as i32);
        assert!(out.leds[led::D]);
        for _ in 0..99 {
            module.render(0, &ControlInputs::default(), &mut out);
        }
        // 100 beats of period/100 land just short of a full cycle
        assert!(module.oscillator().phase > u32::MAX - 200);
    }

    #[test]
    fn phasor_mode_tracks_phase() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Virtual);
        let mut out = Outputs::new(1);
        for _ in 0..50 {
            module.render(0, &ControlInputs::default(), &mut out);
            assert_eq!(out.dac3[0], (module.oscillator().phase >> 20) as i32);
        }
    }

    #[test]
    fn contour_mode_is_a_triangle() {
        assert_eq!(Dac3Mode::Contour.code(0), 0);
        assert_eq!(Dac3Mode::Contour.code(u32::MAX / 2), 4095);
        assert_eq!(Dac3Mode::Contour.code(u32::MAX), 0);
        assert_eq!(Dac3Mode::Phasor.code(u32::MAX), 4095);
    }

    #[test]
    fn hardware_dither_averages_the_low_bits() {
        // 16387 = 2048 * 8 + 3
        let owned = OwnedFamily::from_cycles(&[[16387_i32; 8]]).unwrap();
        let mut module = voice(&owned, RenderTarget::Hardware { block_size: 8 });
        let mut out = Outputs::new(8);
        module.render(0, &ControlInputs::default(), &mut out);
        assert_eq!(out.dac1, [2049, 2049, 2049, 2048, 2048, 2048, 2048, 2048]);
        assert_eq!(out.dac1.iter().sum::<i32>(), 2048 * 8 + 3);
        for (a, b) in out.dac1.iter().zip(&out.dac2) {
            assert_eq!(a + b, 4095);
        }

        let mut virt = voice(&owned, RenderTarget::Virtual);
        let mut single = Outputs::new(1);
        virt.render(0, &ControlInputs::default(), &mut single);
        assert_eq!(single.dac1[0], 2048);
    }

    #[test]
    fn dither_never_overflows_the_dac() {
        let owned = OwnedFamily::from_cycles(&[[32767_i32; 8]]).unwrap();
        let mut module = voice(&owned, RenderTarget::Hardware { block_size: 8 });
        let mut out = Outputs::new(8);
        module.render(0, &ControlInputs::default(), &mut out);
        assert!(out.dac1.iter().all(|&s| s == 4095));
        assert!(out.dac2.iter().all(|&s| s == 0));
    }

    #[test]
    fn writes_only_its_block() {
        let owned = OwnedFamily::default_family().unwrap();
        let mut module = voice(&owned, RenderTarget::Hardware { block_size: 8 });
        let mut out = Outputs::new(24);
        out.dac1.fill(-7);
        module.render(8, &ControlInputs::default(), &mut out);
        assert!(out.dac1[..8].iter().all(|&s| s == -7));
        assert!(out.dac1[8..16].iter().all(|&s| s >= 0));
        assert!(out.dac1[16..].iter().all(|&s| s == -7));
    }
}
