//! Quintic-spline wavetable playback.
//!
//! A wavetable family is a run of equal-length tables laid out back to back.
//! Every word is pre-differenced across the family: the low halfword holds
//! this table's 15-bit sample and the high halfword holds the signed
//! difference to the same position in the next table (zero in the last
//! table). Morphing between neighbouring tables is therefore one
//! [`lerp_prediff`] per point.
//!
//! Each table is a single cycle wrapped with 2 leading and 3 trailing padding
//! words copied from the opposite end of the cycle, so the six-point window
//! `left..left + 6` never leaves the table for any left index inside the
//! cycle. The default firmware families are 9 tables of 517 words (512-sample
//! cycles).
//!
//! The interpolator is a 6-point, 5th-order polynomial centred between the
//! third and fourth points of the window, with integer weights scaled by
//! `699051 / 2^24` (one twenty-fourth).

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::fmt;

use crate::fixed::{fix16_mul, fix24_mul, saturate_unsigned};
use crate::interp::lerp_prediff;

/// Leading loop-padding words per table.
pub const LEAD_PADDING: usize = 2;
/// Trailing loop-padding words per table.
pub const TRAIL_PADDING: usize = 3;
/// Padding added to every cycle.
pub const PADDING: usize = LEAD_PADDING + TRAIL_PADDING;
/// Cycle length of the firmware's families.
pub const DEFAULT_CYCLE_LEN: usize = 512;
/// Padded table length of the firmware's families.
pub const DEFAULT_PADDED_LEN: usize = DEFAULT_CYCLE_LEN + PADDING;

/// One twenty-fourth in 8.24.
const SPLINE_SCALE: i32 = 699_051;

/// Errors raised when wavetable data is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The family has no tables.
    Empty,
    /// A table is shorter than the six-point window.
    TooShort(usize),
    /// `data.len()` is not `table_count * padded_len`.
    LengthMismatch {
        /// `table_count * padded_len`
        expected: usize,
        /// `data.len()`
        actual: usize,
    },
    /// Cycles passed to [`pack_family`] differ in length.
    RaggedCycles {
        /// Length of the first cycle.
        expected: usize,
        /// Length of the offending cycle.
        actual: usize,
    },
    /// A phase oscillator needs a power-of-two cycle length.
    CycleNotPowerOfTwo(usize),
    /// A phase oscillator cannot address more than 2^16 samples per cycle.
    CycleTooLong(usize),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "wavetable family has no tables"),
            Self::TooShort(n) => write!(f, "padded table length {n} is shorter than 6"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} words of table data, found {actual}")
            }
            Self::RaggedCycles { expected, actual } => {
                write!(f, "cycle of {actual} samples in a family of {expected}-sample cycles")
            }
            Self::CycleNotPowerOfTwo(n) => write!(f, "cycle length {n} is not a power of two"),
            Self::CycleTooLong(n) => write!(f, "cycle length {n} exceeds 65536 samples"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}

/// Read-only view over a packed wavetable family.
#[derive(Debug, Clone, Copy)]
pub struct WavetableFamily<'a> {
    data: &'a [u32],
    table_count: usize,
    padded_len: usize,
}

impl<'a> WavetableFamily<'a> {
    /// Wrap `table_count` tables of `padded_len` pre-differenced words.
    pub fn new(data: &'a [u32], table_count: usize, padded_len: usize) -> Result<Self, TableError> {
        if table_count == 0 {
            return Err(TableError::Empty);
        }
        if padded_len < 6 {
            return Err(TableError::TooShort(padded_len));
        }
        let expected = table_count * padded_len;
        if data.len() != expected {
            return Err(TableError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(table_count, padded_len, "wavetable family loaded");

        Ok(Self {
            data,
            table_count,
            padded_len,
        })
    }

    /// Number of tables along the morph axis.
    pub fn table_count(&self) -> usize {
        self.table_count
    }

    /// Words per table including loop padding.
    pub fn padded_len(&self) -> usize {
        self.padded_len
    }

    /// Samples per cycle.
    pub fn cycle_len(&self) -> usize {
        self.padded_len.saturating_sub(PADDING)
    }

    /// Largest morph value that stays on the last table.
    pub fn max_morph(&self) -> u32 {
        ((self.table_count - 1) as u32) << 16
    }

    /// The packed words.
    pub fn data(&self) -> &'a [u32] {
        self.data
    }

    /// Spline sample at `phase` (16.16 sample index) and `morph` (16.16
    /// table index), with the sign of the local slope.
    ///
    /// The sign is 1 when the sample after the centre point is below it.
    /// The sample is clamped to `[0, 32767]`.
    ///
    /// # Panics
    ///
    /// Panics if `morph` is above [`max_morph`](Self::max_morph).
    #[inline]
    pub fn evaluate(&self, phase: u32, morph: u32) -> (i32, i32) {
        let s = self.window(phase, morph);
        let out = spline(&s, (phase & 0xFFFF) as i32);
        let sign = (s[3].wrapping_sub(s[2]) as u32 >> 31) as i32;
        (saturate_unsigned(out, 15), sign)
    }

    /// Spline sample with the raw slope `s3 - s2` and a crossfade back to
    /// the centre sample.
    ///
    /// `crossfade` is Q16: 0 leaves the spline untouched, 65536 returns the
    /// centre sample.
    #[inline]
    pub fn evaluate_delta(&self, phase: u32, morph: u32, crossfade: i32) -> (i32, i32) {
        let s = self.window(phase, morph);
        let mut out = spline(&s, (phase & 0xFFFF) as i32);
        out = out.wrapping_add(fix16_mul(s[2].wrapping_sub(out), crossfade));
        (saturate_unsigned(out, 15), s[3].wrapping_sub(s[2]))
    }

    /// Six morphed points starting at the left neighbour.
    #[inline]
    fn window(&self, phase: u32, morph: u32) -> [i32; 6] {
        let left = (morph >> 16) as usize * self.padded_len + (phase >> 16) as usize;
        debug_assert!(left + 6 <= self.data.len(), "spline window out of range");
        let frac = (morph & 0xFFFF) as i32;
        let words = &self.data[left..left + 6];
        core::array::from_fn(|k| lerp_prediff(words[k] as i32, frac))
    }
}

/// The quintic polynomial over six points at phase fraction `t`.
#[inline]
fn spline(s: &[i32; 6], t: i32) -> i32 {
    let [s0, s1, s2, s3, s4, s5] = *s;
    let c5 = (s3 - s2) * 50 + (s1 - s4) * 25 + (s5 - s0) * 5;
    let c4 = s2 * 126 - s3 * 124 + s4 * 61 - s1 * 64 - s5 * 12 + s0 * 13 + fix16_mul(t, c5);
    let c3 = s3 * 66 - s2 * 70 - s4 * 33 + s1 * 39 + s5 * 7 - s0 * 9 + fix16_mul(t, c4);
    let c2 = (s3 + s1) * 16 - s0 - s2 * 30 - s4 + fix16_mul(t, c3);
    let c1 = (s3 - s1) * 16 + (s0 - s4) * 2 + fix16_mul(t, c2);
    s2 + fix24_mul(SPLINE_SCALE, fix16_mul(t, c1))
}

/// Pack raw single cycles into a pre-differenced, loop-padded family.
///
/// Every cycle must have the same length. Samples are 15-bit unsigned
/// values; the high halfword of each word is the difference to the next
/// cycle at the same position.
///
/// ```rust
/// use via_dsp::{WavetableFamily, pack_family};
///
/// let low = [0_i32, 100, 200, 300];
/// let high = [1000_i32, 1100, 1200, 1300];
/// let data = pack_family(&[low, high]).unwrap();
/// let family = WavetableFamily::new(&data, 2, 9).unwrap();
/// assert_eq!(family.cycle_len(), 4);
/// assert_eq!(family.evaluate(0, 0).0, 0);
/// assert_eq!(family.evaluate(0, 0x8000).0, 500);
/// ```
pub fn pack_family<C: AsRef<[i32]>>(cycles: &[C]) -> Result<Vec<u32>, TableError> {
    let first = cycles.first().ok_or(TableError::Empty)?.as_ref();
    let cycle_len = first.len();
    if cycle_len + PADDING < 6 {
        return Err(TableError::TooShort(cycle_len + PADDING));
    }
    for cycle in cycles {
        let len = cycle.as_ref().len();
        if len != cycle_len {
            return Err(TableError::RaggedCycles {
                expected: cycle_len,
                actual: len,
            });
        }
    }

    let padded_len = cycle_len + PADDING;
    let padded: Vec<Vec<i32>> = cycles
        .iter()
        .map(|cycle| {
            let cycle = cycle.as_ref();
            (0..padded_len)
                .map(|i| cycle[(i + cycle_len - LEAD_PADDING) % cycle_len])
                .collect()
        })
        .collect();

    let mut data = Vec::with_capacity(cycles.len() * padded_len);
    for (t, table) in padded.iter().enumerate() {
        let next = padded.get(t + 1);
        for (i, &sample) in table.iter().enumerate() {
            let delta = next.map_or(0, |n| n[i] - sample);
            data.push(((sample as u32) & 0xFFFF) | ((delta as u32) << 16));
        }
    }
    Ok(data)
}
