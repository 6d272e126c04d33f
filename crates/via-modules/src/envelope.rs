//! Attack / transition / sustain / release envelope.
//!
//! The envelope runs on 16-bit levels (`0..=65535`). Each moving stage
//! sweeps a `u32` position from 0 to overflow at a rate taken from the
//! reverse-exponential table, and shapes its progress through a [`Slope`].
//!
//! ```text
//!  65535 ─────╮
//!            ╱ ╲ transition
//!   attack  ╱   ╲_____________ sustain
//!          ╱                  ╲ release
//!      0 ─╯                    ╲─── rest
//! ```
//!
//! With looping enabled the envelope skips sustain and, while the gate is
//! held, retriggers the attack as soon as the release reaches zero.

use via_dsp::{RevExpoConverter, saturate_unsigned};

use crate::io::ControlInputs;

/// Full-scale envelope level.
pub const LEVEL_MAX: i32 = 0xFFFF;

/// Reverse-expo increments are divided by `2^RATE_SHIFT`: the fastest stage
/// lasts 64 ticks.
const RATE_SHIFT: u32 = 2;

/// Highest time index with a nonzero increment.
const TIME_MAX: i32 = 4094;

/// Curve applied to stage progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Slope {
    /// Straight line.
    #[default]
    Linear,
    /// Slow start, fast finish (cubic).
    Exponential,
    /// Fast start, slow finish (mirrored cubic).
    Logarithmic,
    /// Smoothstep S-curve.
    Sigmoid,
}

impl Slope {
    /// Shape a Q16 progress value; 0 maps to 0 and `0xFFFF` to within 2 LSB
    /// of `0xFFFF`.
    #[inline]
    pub fn shape(self, progress: i32) -> i32 {
        let x = i64::from(progress & 0xFFFF);
        let shaped = match self {
            Self::Linear => x,
            Self::Exponential => (((x * x) >> 16) * x) >> 16,
            Self::Logarithmic => {
                let inv = 0x1_0000 - x;
                (0x1_0000 - ((((inv * inv) >> 16) * inv) >> 16)).clamp(0, 0xFFFF)
            }
            Self::Sigmoid => {
                let x2 = (x * x) >> 16;
                (x2 * (3 * 0x1_0000 - 2 * x)) >> 16
            }
        };
        shaped as i32
    }
}

/// Envelope stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Idle at zero.
    #[default]
    Rest,
    /// Rising to full scale.
    Attack,
    /// Falling from full scale to the sustain level.
    Transition,
    /// Holding while the gate is high.
    Sustain,
    /// Falling to zero.
    Release,
}

impl Stage {
    /// True while the envelope is in its attack/transition cycle.
    pub fn is_cycling(self) -> bool {
        matches!(self, Self::Attack | Self::Transition)
    }
}

/// Front-panel settings, 12-bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeKnobs {
    /// Attack time.
    pub attack: i32,
    /// Transition time.
    pub transition: i32,
    /// Sustain level.
    pub sustain: i32,
    /// Release time.
    pub release: i32,
}

impl Default for EnvelopeKnobs {
    fn default() -> Self {
        Self {
            attack: 1024,
            transition: 1536,
            sustain: 2048,
            release: 2048,
        }
    }
}

/// Per-tick increments and sustain level derived from knobs and CVs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rates {
    /// Attack position increment.
    pub attack: u32,
    /// Transition position increment.
    pub transition: u32,
    /// Release position increment.
    pub release: u32,
    /// Sustain level, 16-bit.
    pub sustain: i32,
}

impl Rates {
    /// CV1 shortens or lengthens attack and transition, CV2 the release,
    /// CV3 offsets the sustain level.
    pub fn from_controls(knobs: &EnvelopeKnobs, inputs: &ControlInputs) -> Self {
        let time = |knob: i32, cv: i32| {
            let index = saturate_unsigned(knob.wrapping_add(cv), 12).min(TIME_MAX);
            RevExpoConverter.convert(index as u32) >> RATE_SHIFT
        };
        Self {
            attack: time(knobs.attack, inputs.cv1),
            transition: time(knobs.transition, inputs.cv1),
            release: time(knobs.release, inputs.cv2),
            sustain: saturate_unsigned(knobs.sustain.wrapping_add(inputs.cv3), 12) << 4,
        }
    }
}

/// Envelope state machine.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    stage: Stage,
    position: u32,
    start: i32,
    level: i32,
    /// Progress curve for every moving stage.
    pub slope: Slope,
    /// Cycle attack/transition/release while the gate is held.
    pub looping: bool,
}

impl Envelope {
    /// Envelope at rest with the given curve.
    pub fn new(slope: Slope, looping: bool) -> Self {
        Self {
            slope,
            looping,
            ..Self::default()
        }
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current 16-bit level.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Start the attack from the current level.
    pub fn gate_on(&mut self) {
        self.enter(Stage::Attack);
    }

    /// Start the release from the current level.
    pub fn gate_off(&mut self) {
        if self.stage != Stage::Rest {
            self.enter(Stage::Release);
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.position = 0;
        self.start = self.level;
    }

    /// Advance `position` by `rate`; true when the stage has finished.
    #[inline]
    fn advance(&mut self, rate: u32) -> bool {
        let (next, done) = self.position.overflowing_add(rate);
        self.position = next;
        done
    }

    /// Advance one tick and return the new level.
    pub fn step(&mut self, rates: &Rates, gate: bool) -> i32 {
        match self.stage {
            Stage::Rest => self.level = 0,
            Stage::Attack => {
                if self.advance(rates.attack) {
                    self.level = LEVEL_MAX;
                    self.enter(Stage::Transition);
                } else {
                    let span = LEVEL_MAX - self.start;
                    self.level = self.start + self.scaled(span);
                }
            }
            Stage::Transition => {
                if self.advance(rates.transition) {
                    self.level = rates.sustain;
                    let next = if self.looping { Stage::Release } else { Stage::Sustain };
                    self.enter(next);
                } else {
                    self.level = LEVEL_MAX - self.scaled(LEVEL_MAX - rates.sustain);
                }
            }
            Stage::Sustain => self.level = rates.sustain,
            Stage::Release => {
                if self.advance(rates.release) {
                    self.level = 0;
                    let next = if self.looping && gate { Stage::Attack } else { Stage::Rest };
                    self.enter(next);
                } else {
                    self.level = self.start - self.scaled(self.start);
                }
            }
        }
        self.level
    }

    /// `span` scaled by the shaped stage progress.
    #[inline]
    fn scaled(&self, span: i32) -> i32 {
        let progress = self.slope.shape((self.position >> 16) as i32);
        ((i64::from(span) * i64::from(progress)) >> 16) as i32
    }
}
