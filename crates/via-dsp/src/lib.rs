//! Via DSP - fixed-point signal core for modular voice cards
//!
//! Every audio-rate routine of a via module is built from the primitives in
//! this crate. Values are `i32` with an implicit binary point, phases are
//! wrapping `u32` accumulators, and wavetables are pre-differenced `u32`
//! words. Nothing in the per-tick path allocates, blocks or returns an error:
//! arithmetic wraps or saturates instead.
//!
//! # Building Blocks
//!
//! - [`fixed`] - truncating multiplies, N-bit clamps, branch-free absolute value
//! - [`backend`] - `Wide` and `Halfword` arithmetic tiers behind one trait
//! - [`buffer`] - power-of-two circular buffers ([`LilBuffer`], [`Buffer`], [`LongBuffer`])
//! - [`interp`] - linear, bilinear and pre-differenced interpolation
//! - [`spline`] - quintic-spline wavetable families ([`WavetableFamily`])
//! - [`tables`] - compile-time sine and exponential tables
//! - [`oscillator`] - phase accumulator with PM, FM and beat playback
//! - [`fold`] - triangle fold and modulo wrap
//!
//! # Backends
//!
//! The default build computes through 64-bit intermediates. Enabling the
//! `halfword` feature switches every backend-sensitive primitive to the
//! packed-halfword sequences of the hardware target, so a desktop build can
//! reproduce hardware output bit for bit.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! via-dsp = { version = "0.1", default-features = false }
//! ```
//!
//! The optional `tracing` feature logs table and oscillator setup. The
//! per-tick path never logs.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod backend;
pub mod buffer;
pub mod fixed;
pub mod fold;
pub mod interp;
pub mod oscillator;
pub mod spline;
pub mod tables;

// Re-export main types at crate root
pub use backend::{Backend, Halfword, Native, Wide};
pub use buffer::{Buffer, CircularBuffer, LilBuffer, LongBuffer};
pub use fixed::{
    Format, absolute, fix15_mul, fix16_mul, fix24_mul, fix32_mul_signed, fix48_mul, multiply,
    saturate_signed, saturate_unsigned, saturating_sub,
};
pub use fold::{fold16, fold25, wrap16};
pub use interp::{
    Prediff, bilerp_prediff, bilerp_prediff_delta, bilerp_prediff_delta_sign, bilerp_sample,
    bilerp15, lerp_prediff, lerp_sample, lerp15, lerp16, lerp16_fast, prediff_delta_sign,
};
pub use oscillator::{PhaseOscillator, WaveSource};
pub use spline::{
    DEFAULT_CYCLE_LEN, DEFAULT_PADDED_LEN, PADDING, TableError, WavetableFamily, pack_family,
};
pub use tables::{BIG_SINE, EXPO, ExpoConverter, REV_EXPO, RevExpoConverter, SINE_PREDIFF};
