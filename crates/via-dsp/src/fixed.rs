//! Fixed-point multiply, saturation and sign helpers.
//!
//! Every value is an `i32` with an implicit binary point. Multiplies widen to
//! 64 bits, shift right by the format's fraction bits and truncate back to 32
//! bits. Nothing here rounds and nothing here saturates unless its name says
//! so: overflow wraps exactly as two's-complement hardware does.
//!
//! | Format | Fraction bits | Typical use |
//! |--------|---------------|-------------|
//! | [`Format::Fix16`] | 16 | phase fractions, frequency scaling |
//! | [`Format::Fix24`] | 24 | spline coefficient scaling |
//! | [`Format::Fix15`] | 15 | sample-domain gains |

/// Position of the implicit binary point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// 16.16
    #[default]
    Fix16,
    /// 8.24
    Fix24,
    /// 15 fraction bits (Q15 gains on a 32-bit carrier).
    Fix15,
}

impl Format {
    /// Number of fractional bits.
    #[inline]
    pub const fn fraction_bits(self) -> u32 {
        match self {
            Self::Fix16 => 16,
            Self::Fix24 => 24,
            Self::Fix15 => 15,
        }
    }

    /// Raw representation of 1.0 in this format.
    #[inline]
    pub const fn one(self) -> i32 {
        1 << self.fraction_bits()
    }
}

/// Multiply two fixed-point values of the same format.
///
/// The product is truncated (not rounded) at the format's binary point and
/// wraps silently when it does not fit in 32 bits.
///
/// ```rust
/// use via_dsp::{Format, multiply};
///
/// // 1.5 * 2.0 in 16.16
/// assert_eq!(multiply(0x1_8000, 0x2_0000, Format::Fix16), 0x3_0000);
/// ```
#[inline]
pub fn multiply(a: i32, b: i32, format: Format) -> i32 {
    ((i64::from(a) * i64::from(b)) >> format.fraction_bits()) as i32
}

/// 16.16 multiply through the build-selected backend.
///
/// Both backends truncate at the same bit, so the result is identical.
#[inline]
pub fn fix16_mul(a: i32, b: i32) -> i32 {
    use crate::backend::{Backend, Native};
    Native::fix16_mul(a, b)
}

/// 8.24 multiply.
#[inline]
pub fn fix24_mul(a: i32, b: i32) -> i32 {
    multiply(a, b, Format::Fix24)
}

/// Multiply with 15 fractional bits.
#[inline]
pub fn fix15_mul(a: i32, b: i32) -> i32 {
    multiply(a, b, Format::Fix15)
}

/// Unsigned 32x32 multiply keeping bits 48.. of the product.
///
/// The 64-bit product is reinterpreted as signed before the shift, so
/// products at or above 2^63 come back negative.
#[inline]
pub fn fix48_mul(a: u32, b: u32) -> i32 {
    ((u64::from(a) * u64::from(b)) as i64 >> 48) as i32
}

/// High word of the signed 64-bit product.
#[inline]
pub fn fix32_mul_signed(a: i32, b: i32) -> i32 {
    ((i64::from(a) * i64::from(b)) >> 32) as i32
}

/// Clamp `x` into `[0, 2^bits - 1]`.
///
/// `bits` must be in `0..=31`.
///
/// ```rust
/// use via_dsp::saturate_unsigned;
///
/// assert_eq!(saturate_unsigned(5000, 12), 4095);
/// assert_eq!(saturate_unsigned(-3, 12), 0);
/// ```
#[inline]
pub fn saturate_unsigned(x: i32, bits: u32) -> i32 {
    debug_assert!(bits <= 31);
    let max = ((1_i64 << bits) - 1) as i32;
    x.clamp(0, max)
}

/// Clamp `x` into `[-(2^(bits-1) - 1), 2^(bits-1) - 1]`.
///
/// The range is symmetric: the most negative two's-complement value of the
/// width is never produced. `bits` must be in `1..=32`.
#[inline]
pub fn saturate_signed(x: i32, bits: u32) -> i32 {
    debug_assert!((1..=32).contains(&bits));
    let max = ((1_i64 << (bits - 1)) - 1) as i32;
    x.clamp(-max, max)
}

/// Branch-free absolute value.
///
/// `absolute(i32::MIN)` wraps back to `i32::MIN`.
#[inline]
pub fn absolute(x: i32) -> i32 {
    let mask = x >> 31;
    (x ^ mask).wrapping_sub(mask)
}

/// Signed saturating subtract (`a - b` clamped to the `i32` range).
#[inline]
pub fn saturating_sub(a: i32, b: i32) -> i32 {
    a.saturating_sub(b)
}
