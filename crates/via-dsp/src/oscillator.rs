//! Phase-accumulator oscillator.
//!
//! The phase is a free-running `u32` that wraps once per cycle. Each tick adds
//! the frequency increment plus the per-tick phase modulation nudge, then
//! reads the waveform source at the new phase.
//!
//! Phase modulation arrives as an absolute signal and is differenced into a
//! per-tick increment by [`PhaseOscillator::update_phase_modulation`], so it
//! composes additively with the free-running frequency term and never
//! accumulates drift.
//!
//! # Example
//!
//! ```rust
//! use via_dsp::PhaseOscillator;
//!
//! let mut osc = PhaseOscillator::sine();
//! osc.frequency = 1 << 22; // 1024 ticks per cycle
//! let first = osc.step();
//! assert!(first > 16383);
//! ```

use crate::fixed::fix16_mul;
use crate::interp::{lerp_prediff, lerp_sample};
use crate::spline::{TableError, WavetableFamily};
use crate::tables::{BIG_SINE, SINE_PREDIFF};

/// What the oscillator reads at each phase.
#[derive(Debug, Clone, Copy)]
pub enum WaveSource<'a> {
    /// The static 4096-step sine.
    Sine,
    /// A quintic-spline wavetable family with a `2^k` sample cycle.
    Spline {
        /// Family being played.
        family: WavetableFamily<'a>,
        /// `16 - k`: right shift from phase to 16.16 sample index.
        shift: u32,
    },
}

impl<'a> WaveSource<'a> {
    /// Spline source over `family`.
    ///
    /// The cycle length must be a power of two no longer than 65536.
    pub fn spline(family: WavetableFamily<'a>) -> Result<Self, TableError> {
        let cycle = family.cycle_len();
        if !cycle.is_power_of_two() {
            return Err(TableError::CycleNotPowerOfTwo(cycle));
        }
        let bits = cycle.trailing_zeros();
        if bits > 16 {
            return Err(TableError::CycleTooLong(cycle));
        }
        Ok(Self::Spline {
            family,
            shift: 16 - bits,
        })
    }
}

/// Oscillator state.
///
/// All fields are plain data so a render strategy can drive them directly.
#[derive(Debug, Clone)]
pub struct PhaseOscillator<'a> {
    /// Phase increment per tick (two's complement, may be negative).
    pub frequency: i32,
    /// Accumulated phase.
    pub phase: u32,
    /// Per-tick modulation nudge.
    pub phase_modulation: i32,
    /// Previous absolute modulation input.
    pub last_phase_modulation: i32,
    /// Table position for spline sources (16.16), clamped to the family's
    /// `max_morph()` when read.
    pub morph: u32,
    /// Zero-crossing indicator from the last spline evaluation.
    pub delta: i32,
    source: WaveSource<'a>,
}

impl PhaseOscillator<'static> {
    /// Oscillator over the static sine.
    pub fn sine() -> Self {
        Self::new(WaveSource::Sine)
    }
}

impl<'a> PhaseOscillator<'a> {
    /// Oscillator at rest over `source`.
    pub fn new(source: WaveSource<'a>) -> Self {
        Self {
            frequency: 0,
            phase: 0,
            phase_modulation: 0,
            last_phase_modulation: 0,
            morph: 0,
            delta: 0,
            source,
        }
    }

    /// Oscillator over a spline family.
    pub fn spline(family: WavetableFamily<'a>) -> Result<Self, TableError> {
        let source = WaveSource::spline(family)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(cycle_len = family.cycle_len(), "spline oscillator created");

        Ok(Self::new(source))
    }

    /// Current waveform source.
    pub fn source(&self) -> &WaveSource<'a> {
        &self.source
    }

    /// Swap the waveform source, keeping phase.
    pub fn set_source(&mut self, source: WaveSource<'a>) {
        self.source = source;
    }

    /// Difference an absolute modulation input into the per-tick nudge.
    #[inline]
    pub fn update_phase_modulation(&mut self, input: i32) {
        self.phase_modulation = input.wrapping_sub(self.last_phase_modulation);
        self.last_phase_modulation = input;
    }

    /// Advance one tick and read the source.
    #[inline]
    pub fn step(&mut self) -> i32 {
        let increment = self.frequency.wrapping_add(self.phase_modulation);
        self.phase = self.phase.wrapping_add(increment as u32);
        self.read()
    }

    /// Advance one tick with the frequency scaled by a 16.16 `fm` multiplier.
    #[inline]
    pub fn step_with_fm(&mut self, fm: i32) -> i32 {
        let increment = fix16_mul(self.frequency, fm).wrapping_add(self.phase_modulation);
        self.phase = self.phase.wrapping_add(increment as u32);
        self.read()
    }

    /// Set the phase to `index * frequency` and read the source.
    ///
    /// Used for playback locked to an external count instead of
    /// free-running accumulation.
    #[inline]
    pub fn step_beat(&mut self, index: i32) -> i32 {
        self.phase = index.wrapping_mul(self.frequency) as u32;
        self.read()
    }

    /// Return the phase to the start of the cycle.
    pub fn reset_phase(&mut self) {
        self.phase = 0;
    }

    /// Read the source at the current phase without advancing.
    #[inline]
    pub fn read(&mut self) -> i32 {
        match self.source {
            WaveSource::Sine => {
                let index = (self.phase >> 20) as usize;
                let frac = ((self.phase >> 4) & 0xFFFF) as i32;
                lerp_prediff(SINE_PREDIFF[index] as i32, frac)
            }
            WaveSource::Spline { family, shift } => {
                let morph = self.morph.min(family.max_morph());
                let (sample, delta) = family.evaluate(self.phase >> shift, morph);
                self.delta = delta;
                sample
            }
        }
    }

    /// Sine at `phase` read straight from the 4097-entry table.
    #[inline]
    pub fn sine_from_flash(phase: u32) -> i32 {
        let index = (phase >> 20) as usize;
        let frac = ((phase >> 4) & 0xFFFF) as i32;
        lerp_sample(BIG_SINE[index], BIG_SINE[index + 1], frac)
    }
}
