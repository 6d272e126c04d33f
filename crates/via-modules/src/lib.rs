//! Via Modules - per-block render modules for via voice cards
//!
//! A module turns one tick of control inputs into a block of DAC samples
//! plus logic, sample-and-hold and LED states:
//!
//! - [`AtsrModule`] - attack / transition / sustain / release envelope
//! - [`WavetableModule`] - quintic-spline wavetable voice with PM and clock lock
//!
//! Both implement [`Render`] and are wrapped by the closed [`Module`] enum
//! for drivers that pick a module at runtime.
//!
//! ## Example
//!
//! ```rust
//! use via_modules::{
//!     AtsrModule, Calibration, ControlInputs, EnvelopeKnobs, Outputs, Render, RenderTarget,
//!     Slope,
//! };
//!
//! let target = RenderTarget::Hardware { block_size: 8 };
//! let mut module = AtsrModule::new(
//!     EnvelopeKnobs::default(),
//!     Slope::Linear,
//!     false,
//!     target,
//!     Calibration::default(),
//! );
//! let mut outputs = Outputs::new(16);
//! let gate = ControlInputs { gate: true, ..ControlInputs::default() };
//!
//! // render into the second half of the ring
//! module.render(8, &gate, &mut outputs);
//! assert!(outputs.dac1[8..].iter().all(|&s| (0..4096).contains(&s)));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod atsr;
pub mod calibration;
pub mod envelope;
pub mod family;
pub mod io;
pub mod render;
pub mod wavetable;

// Re-export main types at crate root
pub use atsr::{AtsrModule, GATE_DELAY};
pub use calibration::Calibration;
pub use envelope::{Envelope, EnvelopeKnobs, LEVEL_MAX, Rates, Slope, Stage};
pub use family::{DEFAULT_TABLE_COUNT, FamilyShape, OwnedFamily};
pub use io::{Channel, ControlInputs, Outputs, RenderTarget, led};
pub use render::{Module, Render};
pub use wavetable::{Dac3Mode, INITIAL_INCREMENT, WavetableKnobs, WavetableModule};

// Init-path error shared with the DSP core
pub use via_dsp::TableError;
