//! Per-tick inputs and per-block outputs exchanged with the driver layer.
//!
//! CV inputs are bipolar 12-bit values (`-2048..=2047`) before calibration.
//! DAC outputs are unsigned 12-bit samples (`0..=4095`). Logic and LED
//! outputs are plain booleans; mapping them onto port masks is the driver's
//! job.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

/// Control values sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlInputs {
    /// CV1, bipolar 12-bit.
    pub cv1: i32,
    /// CV2, bipolar 12-bit.
    pub cv2: i32,
    /// CV3, bipolar 12-bit.
    pub cv3: i32,
    /// Gate level.
    pub gate: bool,
    /// Trigger edge seen this tick.
    pub trigger: bool,
    /// Clock edge seen this tick.
    pub clock: bool,
}

/// Where rendered samples go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderTarget {
    /// Desktop rendering: one undithered sample per channel per call.
    #[default]
    Virtual,
    /// DAC ring on the card: `block_size` samples per channel per call.
    Hardware {
        /// Samples written per call.
        block_size: usize,
    },
}

impl RenderTarget {
    /// Samples each render call writes to every DAC channel.
    pub fn samples_per_call(self) -> usize {
        match self {
            Self::Virtual => 1,
            Self::Hardware { block_size } => block_size,
        }
    }
}

/// DAC channel selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Channel {
    /// DAC1 (A output).
    #[default]
    Dac1,
    /// DAC2 (B output).
    Dac2,
    /// DAC3 (logic/contour output).
    Dac3,
}

/// LED indices in [`Outputs::leds`].
pub mod led {
    /// Follows the A level.
    pub const A: usize = 0;
    /// Follows the B level.
    pub const B: usize = 1;
    /// Follows logic A.
    pub const C: usize = 2;
    /// Module-specific status.
    pub const D: usize = 3;
}

/// Caller-owned output block.
///
/// The DAC arrays are allocated once and rewritten in place by every render
/// call; the logic, sample-and-hold and LED fields hold the state after the
/// most recent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    /// DAC1 samples.
    pub dac1: Vec<i32>,
    /// DAC2 samples.
    pub dac2: Vec<i32>,
    /// DAC3 samples.
    pub dac3: Vec<i32>,
    /// Logic A output.
    pub logic_a: bool,
    /// Expander logic output.
    pub aux_logic: bool,
    /// Sample-and-hold A engaged.
    pub sh_a: bool,
    /// Sample-and-hold B engaged.
    pub sh_b: bool,
    /// Front-panel LEDs, indexed by [`led`].
    pub leds: [bool; 4],
}

impl Outputs {
    /// Zeroed block of `len` samples per DAC channel.
    pub fn new(len: usize) -> Self {
        Self {
            dac1: vec![0; len],
            dac2: vec![0; len],
            dac3: vec![0; len],
            logic_a: false,
            aux_logic: false,
            sh_a: false,
            sh_b: false,
            leds: [false; 4],
        }
    }

    /// Block sized for one call on `target`.
    pub fn for_target(target: RenderTarget) -> Self {
        Self::new(target.samples_per_call())
    }

    /// Samples per DAC channel.
    pub fn len(&self) -> usize {
        self.dac1.len()
    }

    /// True when the block holds no samples.
    pub fn is_empty(&self) -> bool {
        self.dac1.is_empty()
    }

    /// Samples of one channel.
    pub fn channel(&self, channel: Channel) -> &[i32] {
        match channel {
            Channel::Dac1 => &self.dac1,
            Channel::Dac2 => &self.dac2,
            Channel::Dac3 => &self.dac3,
        }
    }
}
