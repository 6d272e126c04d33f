//! Static lookup tables.
//!
//! All tables are computed at compile time and live in read-only memory.
//! Transcendentals are evaluated with fixed-length Taylor series in `const fn`
//! and truncated, which reproduces the firmware's table data word for word.
//!
//! | Table | Length | Contents |
//! |-------|--------|----------|
//! | [`BIG_SINE`] | 4097 | one sine cycle, `0..=32767`, centre 16383, closing sample repeated |
//! | [`SINE_PREDIFF`] | 4096 | [`BIG_SINE`] packed as [`Prediff`](crate::Prediff) words |
//! | [`EXPO`] | 4096 | `65536 * 2^(i / 384)`: ten octaves of 1 V/oct scaling |
//! | [`REV_EXPO`] | 4096 | `2^28 * 2^(-i / 384)`, last entry 0 |

use core::f64::consts::{LN_2, PI, TAU};

/// Entries in [`BIG_SINE`].
pub const SINE_LEN: usize = 4097;
/// Entries in the expo tables.
pub const EXPO_LEN: usize = 4096;
/// Expo table steps per octave.
pub const STEPS_PER_OCTAVE: usize = 384;

/// 15-bit unipolar sine, 4096 steps per cycle plus the wrap sample.
pub static BIG_SINE: [i32; SINE_LEN] = build_sine();

/// [`BIG_SINE`] as pre-differenced words for one-fetch interpolation.
pub static SINE_PREDIFF: [u32; SINE_LEN - 1] = build_sine_prediff();

/// Exponential frequency scale, 16.16, starting at 1.0.
pub static EXPO: [u32; EXPO_LEN] = build_expo();

/// Reverse exponential scale starting at `2^28`.
pub static REV_EXPO: [u32; EXPO_LEN] = build_rev_expo();

const fn sin_taylor(x: f64) -> f64 {
    let x = if x > PI { x - TAU } else { x };
    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    let mut n = 1;
    while n < 16 {
        term = -term * x2 / ((2 * n) * (2 * n + 1)) as f64;
        sum += term;
        n += 1;
    }
    sum
}

const fn exp_taylor(x: f64) -> f64 {
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut n = 1;
    while n < 24 {
        term = term * x / n as f64;
        sum += term;
        n += 1;
    }
    sum
}

const fn build_sine() -> [i32; SINE_LEN] {
    let mut table = [0; SINE_LEN];
    let mut i = 0;
    while i < SINE_LEN {
        let angle = TAU * i as f64 / 4096.0;
        table[i] = (16383.5 + 16383.5 * sin_taylor(angle)) as i32;
        i += 1;
    }
    table
}

const fn build_sine_prediff() -> [u32; SINE_LEN - 1] {
    let sine = build_sine();
    let mut table = [0; SINE_LEN - 1];
    let mut i = 0;
    while i < SINE_LEN - 1 {
        let delta = sine[i + 1] - sine[i];
        table[i] = (sine[i] as u32 & 0xFFFF) | ((delta as u32) << 16);
        i += 1;
    }
    table
}

const fn build_expo() -> [u32; EXPO_LEN] {
    let mut table = [0; EXPO_LEN];
    let mut i = 0;
    while i < EXPO_LEN - 1 {
        let octave = (1_u32 << (i / STEPS_PER_OCTAVE)) as f64;
        let step = (i % STEPS_PER_OCTAVE) as f64 * LN_2 / 384.0;
        table[i] = (65536.0 * octave * exp_taylor(step)) as u32;
        i += 1;
    }
    // top entry holds the previous value
    table[EXPO_LEN - 1] = table[EXPO_LEN - 2];
    table
}

const fn build_rev_expo() -> [u32; EXPO_LEN] {
    let mut table = [0; EXPO_LEN];
    let mut i = 0;
    while i < EXPO_LEN - 1 {
        let octave = (1_u32 << (i / STEPS_PER_OCTAVE)) as f64;
        let step = (i % STEPS_PER_OCTAVE) as f64 * LN_2 / 384.0;
        table[i] = (268_435_456.0 / octave * exp_taylor(-step)) as u32;
        i += 1;
    }
    table
}

/// 12-bit control value to exponential increment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpoConverter;

impl ExpoConverter {
    /// Look up `input`, masked to 12 bits.
    #[inline]
    pub fn convert(&self, input: u32) -> u32 {
        EXPO[(input & 0xFFF) as usize]
    }
}

/// 12-bit control value to reverse exponential scale (falling with input).
#[derive(Clone, Copy, Debug, Default)]
pub struct RevExpoConverter;

impl RevExpoConverter {
    /// Look up `input`, masked to 12 bits.
    #[inline]
    pub fn convert(&self, input: u32) -> u32 {
        REV_EXPO[(input & 0xFFF) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_anchors() {
        assert_eq!(BIG_SINE[0], 16383);
        assert_eq!(BIG_SINE[1], 16408);
        assert_eq!(BIG_SINE[512], 27968);
        assert_eq!(BIG_SINE[1024], 32767);
        assert_eq!(BIG_SINE[2048], 16383);
        assert_eq!(BIG_SINE[3072], 0);
        assert_eq!(BIG_SINE[4096], BIG_SINE[0]);
    }

    #[test]
    fn sine_stays_in_15_bits() {
        assert!(BIG_SINE.iter().all(|&s| (0..=32767).contains(&s)));
    }

    #[test]
    fn sine_prediff_reconstructs_neighbours() {
        for i in 0..SINE_LEN - 1 {
            let word = SINE_PREDIFF[i];
            let base = (word & 0xFFFF) as i32;
            let delta = (word as i32) >> 16;
            assert_eq!(base, BIG_SINE[i]);
            assert_eq!(base + delta, BIG_SINE[i + 1]);
        }
    }

    #[test]
    fn expo_doubles_per_octave() {
        assert_eq!(EXPO[0], 65536);
        assert_eq!(EXPO[384], 131_072);
        assert_eq!(EXPO[768], 262_144);
        assert_eq!(EXPO[1], 65654);
        assert_eq!(EXPO[4095], EXPO[4094]);
        assert_eq!(EXPO[4094], 106_144_791);
        assert!(EXPO.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rev_expo_halves_per_octave() {
        assert_eq!(REV_EXPO[0], 1 << 28);
        assert_eq!(REV_EXPO[1], 267_951_348);
        assert_eq!(REV_EXPO[384], 1 << 27);
        assert_eq!(REV_EXPO[4094], 165_737);
        assert_eq!(REV_EXPO[4095], 0);
        assert!(REV_EXPO.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn converters_mask_input() {
        assert_eq!(ExpoConverter.convert(384), 131_072);
        assert_eq!(ExpoConverter.convert(0x1000), 65536);
        assert_eq!(RevExpoConverter.convert(0), 1 << 28);
        assert_eq!(RevExpoConverter.convert(0x1180), 1 << 27);
    }
}
