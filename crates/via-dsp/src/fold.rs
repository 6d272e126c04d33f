//! Triangle fold and modulo wrap of phase-like control values.
//!
//! Folding mirrors every other period of the input, so a value that keeps
//! rising comes back out as a triangle. Wrapping simply keeps the low bits.

use crate::backend::{Backend, Native};

/// Fold into `[0, 2^16)`.
///
/// ```rust
/// use via_dsp::fold16;
///
/// assert_eq!(fold16(100), 100);
/// assert_eq!(fold16(0x1_0000 + 100), 65535 - 100);
/// assert_eq!(fold16(0x2_0000 + 100), 100);
/// ```
#[inline]
pub fn fold16(x: i32) -> i32 {
    if (x >> 16) & 1 == 1 { 65535 - (x & 0xFFFF) } else { x & 0xFFFF }
}

/// Fold into `[0, 2^25)`.
///
/// The result depends on the backend in the lowest bit only.
#[inline]
pub fn fold25(x: u32) -> u32 {
    Native::fold25(x)
}

/// `x mod 2^16`.
#[inline]
pub fn wrap16(x: i32) -> i32 {
    x & 0xFFFF
}
