//! Patch files for via voice card modules.
//!
//! A patch is a TOML file naming one module with its knob settings, the
//! card's calibration constants, a render target and a script of control
//! inputs. It is everything needed to render the module offline.
//!
//! # Features
//!
//! - **Patches**: Load, save and validate [`Patch`] files
//! - **Controls**: Turn scripted gates, clocks and CV sweeps into per-tick inputs
//! - **Factory Patches**: Built-in patches covering both modules
//!
//! # Example
//!
//! ```rust
//! use via_config::get_factory_patch;
//! use via_modules::{Outputs, Render};
//!
//! let patch = get_factory_patch("envelope").unwrap();
//! let family = patch.family().unwrap();
//! let mut module = patch.build_module(family.as_ref()).unwrap();
//! let mut outputs = Outputs::for_target(patch.render_target());
//!
//! for inputs in patch.schedule().iter().take(100) {
//!     module.render(0, &inputs, &mut outputs);
//! }
//! ```

mod error;
mod patch;

/// Scripted control inputs.
pub mod controls;

/// Factory patches bundled with the library.
pub mod factory;

pub use controls::{ControlSchedule, ControlsConfig, CvInput, SweepConfig};
pub use error::ConfigError;
pub use factory::{factory_patch_names, factory_patches, get_factory_patch};
pub use patch::{
    AtsrConfig, CalibrationConfig, Dac3ModeConfig, MAX_BLOCK_SIZE, MAX_DURATION_SECS,
    MAX_SAMPLE_RATE, MAX_TABLES, ModuleConfig, Patch, ShapeConfig, SlopeConfig, TargetConfig,
    TargetKind, WavetableConfig,
};
