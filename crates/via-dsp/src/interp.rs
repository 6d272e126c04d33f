//! Linear and bilinear interpolation.
//!
//! Fractions are unsigned fixed-point values in `[0, 1)`: 16-bit fractions
//! run `0..=0xFFFF`, 15-bit fractions `0..=0x7FFF`. A fraction never reaches
//! 1.0, so `lerp(a, b, max)` lands within one LSB short of `b`.
//!
//! The "prediff" variants read a [`Prediff`] word that packs a base value and
//! the difference to the next value into one `u32`, so one fetch is enough for
//! the first interpolation stage. Wavetable families store every sample this
//! way (see [`crate::spline`]).

use crate::backend::{Backend, Native, pack_halfwords, smlad};
use crate::fixed::{fix16_mul, saturating_sub};

/// `a + (b - a) * frac` in 16.16.
///
/// ```rust
/// use via_dsp::lerp16;
///
/// assert_eq!(lerp16(0, 1000, 0x8000), 500);
/// ```
#[inline]
pub fn lerp16(a: i32, b: i32, frac: i32) -> i32 {
    a.wrapping_add(fix16_mul(b.wrapping_sub(a), frac))
}

/// 16.16 lerp without the 64-bit widening.
///
/// Exact only while `(b - a) * frac` fits in 32 bits, i.e. for 15-bit inputs.
#[inline]
pub fn lerp16_fast(a: i32, b: i32, frac: i32) -> i32 {
    a.wrapping_add(b.wrapping_sub(a).wrapping_mul(frac) >> 16)
}

/// Lerp with a 15-bit fraction.
///
/// The low bits depend on the backend; both tiers agree within 2 LSB.
#[inline]
pub fn lerp15(a: i32, b: i32, frac: i32) -> i32 {
    Native::lerp15(a, b, frac)
}

/// Lerp between sample values with a 16-bit fraction.
#[inline]
pub fn lerp_sample(a: i32, b: i32, frac: i32) -> i32 {
    Native::lerp_sample(a, b, frac)
}

/// Interpolate `a -> b` and `c -> d` by `frac0`, then the two results by
/// `frac1`. 15-bit fractions.
#[inline]
pub fn bilerp15(a: i32, b: i32, c: i32, d: i32, frac0: i32, frac1: i32) -> i32 {
    lerp15(lerp15(a, b, frac0), lerp15(c, d, frac0), frac1)
}

/// [`bilerp15`] over sample values with 16-bit fractions.
#[inline]
pub fn bilerp_sample(a: i32, b: i32, c: i32, d: i32, frac0: i32, frac1: i32) -> i32 {
    lerp_sample(lerp_sample(a, b, frac0), lerp_sample(c, d, frac0), frac1)
}

/// Packed pre-differenced word: base value in the low halfword, signed
/// difference to the next value in the high halfword.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Prediff(pub u32);

impl Prediff {
    /// Pack an unsigned 16-bit base with a signed 16-bit delta.
    ///
    /// Bits outside those widths are discarded.
    #[inline]
    pub const fn pack(base: i32, delta: i32) -> Self {
        Self((base as u32 & 0xFFFF) | ((delta as u32) << 16))
    }

    /// Unsigned base value.
    #[inline]
    pub const fn base(self) -> i32 {
        (self.0 & 0xFFFF) as i32
    }

    /// Signed difference to the next value.
    #[inline]
    pub const fn delta(self) -> i32 {
        (self.0 as i32) >> 16
    }

    /// Raw word as the signed carrier the interpolators take.
    #[inline]
    pub const fn word(self) -> i32 {
        self.0 as i32
    }
}

impl From<u32> for Prediff {
    fn from(word: u32) -> Self {
        Self(word)
    }
}

/// `base + (delta * frac) >> 16` for one packed word.
///
/// ```rust
/// use via_dsp::{Prediff, lerp_prediff};
///
/// let word = Prediff::pack(100, 200).word();
/// assert_eq!(lerp_prediff(word, 0), 100);
/// assert_eq!(lerp_prediff(word, 0x8000), 200);
/// ```
#[inline]
pub fn lerp_prediff(word: i32, frac: i32) -> i32 {
    Native::lerp_prediff(word, frac)
}

/// First stage on each packed word by `frac0`, second stage by `frac1`.
#[inline]
pub fn bilerp_prediff(w0: i32, w1: i32, frac0: i32, frac1: i32) -> i32 {
    bilerp_prediff_delta(w0, w1, frac0, frac1).0
}

/// [`bilerp_prediff`] plus the sign of the first-stage difference:
/// 1 when the second value is below the first, else 0.
#[inline]
pub fn bilerp_prediff_delta_sign(w0: i32, w1: i32, frac0: i32, frac1: i32) -> (i32, i32) {
    let (value, delta) = bilerp_prediff_delta(w0, w1, frac0, frac1);
    (value, (delta as u32 >> 31) as i32)
}

/// [`bilerp_prediff`] plus the raw first-stage difference `v1 - v0`.
#[inline]
pub fn bilerp_prediff_delta(w0: i32, w1: i32, frac0: i32, frac1: i32) -> (i32, i32) {
    let v0 = lerp_prediff(w0, frac0);
    let v1 = lerp_prediff(w1, frac0);
    (lerp_sample(v0, v1, frac1), v1.wrapping_sub(v0))
}

/// Sign of the difference between two packed words interpolated by `frac`.
///
/// Both halves are differenced in one saturating subtract, then
/// `base_diff + delta_diff * frac` is accumulated with a dual halfword
/// multiply. Returns 1 when that sum is negative, else 0. `frac` is a 15-bit
/// fraction so it fits the signed halfword.
#[inline]
pub fn prediff_delta_sign(w0: i32, w1: i32, frac: i32) -> i32 {
    let diff = saturating_sub(w1, w0) as u32;
    let weights = pack_halfwords(1, frac as u32, 16);
    (smlad(weights, diff, 0) as u32 >> 31) as i32
}
