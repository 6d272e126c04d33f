//! Init-time wavetable family synthesis.
//!
//! Families are normally flashed as data. For desktop rendering and tests
//! they are synthesized here: each shape sweeps a timbre across the morph
//! axis, every cycle is normalised to the full 15-bit range around 16383,
//! and the cycles are packed with [`pack_family`].
//!
//! Uses floating point; call once at startup, never from a render step.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use core::f64::consts::{FRAC_PI_2, TAU};

use via_dsp::{DEFAULT_CYCLE_LEN, PADDING, TableError, WavetableFamily, pack_family};

/// Number of tables in the default family.
pub const DEFAULT_TABLE_COUNT: usize = 9;

/// Timbre sweep along the morph axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FamilyShape {
    /// Sine growing into a band-limited saw as harmonics are added.
    #[default]
    Harmonic,
    /// Band-limited pulse narrowing from square to a thin spike.
    Pulse,
    /// Sine driven progressively harder through a sine wavefolder.
    Fold,
}

/// Packed family data with its shape, ready to borrow as a
/// [`WavetableFamily`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFamily {
    data: Vec<u32>,
    table_count: usize,
    padded_len: usize,
}

impl OwnedFamily {
    /// Synthesize and pack `table_count` cycles of `cycle_len` samples.
    pub fn synthesize(
        shape: FamilyShape,
        table_count: usize,
        cycle_len: usize,
    ) -> Result<Self, TableError> {
        let family = Self::from_cycles(&synthesize(shape, table_count, cycle_len))?;

        #[cfg(feature = "tracing")]
        tracing::info!(?shape, table_count, cycle_len, "wavetable family synthesized");

        Ok(family)
    }

    /// Pack raw 15-bit cycles of equal length, one per table.
    pub fn from_cycles<C: AsRef<[i32]>>(cycles: &[C]) -> Result<Self, TableError> {
        let data = pack_family(cycles)?;
        let cycle_len = cycles.first().map_or(0, |c| c.as_ref().len());
        Ok(Self {
            data,
            table_count: cycles.len(),
            padded_len: cycle_len + PADDING,
        })
    }

    /// The firmware-shaped default: 9 harmonic tables of 512 samples.
    pub fn default_family() -> Result<Self, TableError> {
        Self::synthesize(FamilyShape::Harmonic, DEFAULT_TABLE_COUNT, DEFAULT_CYCLE_LEN)
    }

    /// Borrow as an evaluator.
    pub fn family(&self) -> Result<WavetableFamily<'_>, TableError> {
        WavetableFamily::new(&self.data, self.table_count, self.padded_len)
    }

    /// Packed words.
    pub fn data(&self) -> &[u32] {
        &self.data
    }
}

/// Raw 15-bit cycles for `shape`, one per table.
pub fn synthesize(shape: FamilyShape, table_count: usize, cycle_len: usize) -> Vec<Vec<i32>> {
    let last = table_count.saturating_sub(1).max(1) as f64;
    (0..table_count)
        .map(|t| {
            let position = t as f64 / last;
            let raw: Vec<f64> = (0..cycle_len)
                .map(|i| {
                    let x = TAU * i as f64 / cycle_len as f64;
                    sample(shape, position, x, cycle_len)
                })
                .collect();
            normalize(&raw)
        })
        .collect()
}

/// One unnormalised sample at angle `x` for morph `position` in `[0, 1]`.
fn sample(shape: FamilyShape, position: f64, x: f64, cycle_len: usize) -> f64 {
    let nyquist = (cycle_len / 2).max(1);
    match shape {
        FamilyShape::Harmonic => {
            let harmonics = (libm::pow(2.0, position * 6.0) as usize).clamp(1, nyquist);
            band_limited_saw(x, harmonics)
        }
        FamilyShape::Pulse => {
            let width = 0.5 - 0.45 * position;
            let harmonics = (cycle_len / 4).max(1);
            band_limited_saw(x, harmonics) - band_limited_saw(x - TAU * width, harmonics)
        }
        FamilyShape::Fold => {
            let drive = 1.0 + 4.0 * position;
            libm::sin(drive * FRAC_PI_2 * libm::sin(x))
        }
    }
}

/// Sum of `sin(h x) / h` for `h` in `1..=harmonics`.
fn band_limited_saw(x: f64, harmonics: usize) -> f64 {
    (1..=harmonics)
        .map(|h| libm::sin(h as f64 * x) / h as f64)
        .sum()
}

/// Centre on the mean and scale the peak to the 15-bit range.
fn normalize(raw: &[f64]) -> Vec<i32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let mean = raw.iter().sum::<f64>() / raw.len() as f64;
    let peak = raw.iter().map(|v| libm::fabs(v - mean)).fold(0.0, f64::max);
    if peak == 0.0 {
        return vec![16383; raw.len()];
    }
    raw.iter()
        .map(|v| {
            let scaled = 16383.0 + 16383.0 * (v - mean) / peak;
            (libm::round(scaled) as i32).clamp(0, 32767)
        })
        .collect()
}
