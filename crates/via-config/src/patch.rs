//! Patch file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use via_modules::{
    AtsrModule, Calibration, Dac3Mode, EnvelopeKnobs, FamilyShape, Module, OwnedFamily,
    RenderTarget, Slope, WavetableKnobs, WavetableModule,
};

use crate::controls::{ControlSchedule, ControlsConfig};
use crate::error::ConfigError;

/// Highest sample rate a patch may ask for.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Longest render a patch may ask for, in seconds.
pub const MAX_DURATION_SECS: f64 = 3600.0;
/// Largest hardware block.
pub const MAX_BLOCK_SIZE: usize = 4096;
/// Most tables in a synthesized family.
pub const MAX_TABLES: usize = 64;

/// A module, its controls and where it renders, stored as TOML.
///
/// # TOML Format
///
/// ```toml
/// name = "Slow Swell"
/// description = "Looping envelope with a long release"
/// sample_rate = 48000
/// duration_secs = 4.0
///
/// [target]
/// kind = "hardware"
/// block_size = 32
///
/// [module]
/// type = "atsr"
/// slope = "sigmoid"
/// looping = true
/// attack = 3000
/// release = 3500
///
/// [calibration]
/// dac3_offset = 12
///
/// [controls]
/// gate_on_secs = 2.0
/// gate_off_secs = 2.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patch {
    /// Name of the patch.
    pub name: String,

    /// Optional description of the patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// DAC sample rate in Hz (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Render length in seconds (defaults to 2).
    #[serde(default = "default_duration")]
    pub duration_secs: f64,

    /// Render target.
    #[serde(default)]
    pub target: TargetConfig,

    /// The module and its settings.
    pub module: ModuleConfig,

    /// Calibration constants.
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// Scripted control inputs.
    #[serde(default)]
    pub controls: ControlsConfig,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_duration() -> f64 {
    2.0
}

/// Render target kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// One undithered sample per tick.
    #[default]
    Virtual,
    /// One dithered block per tick.
    Hardware,
}

/// The `[target]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Virtual or hardware rendering.
    pub kind: TargetKind,
    /// Samples per tick on the hardware target.
    pub block_size: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            kind: TargetKind::Virtual,
            block_size: 32,
        }
    }
}

impl From<TargetConfig> for RenderTarget {
    fn from(target: TargetConfig) -> Self {
        match target.kind {
            TargetKind::Virtual => RenderTarget::Virtual,
            TargetKind::Hardware => RenderTarget::Hardware {
                block_size: target.block_size,
            },
        }
    }
}

/// The `[calibration]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Subtracted from CV1.
    pub cv1_offset: i32,
    /// Subtracted from CV2.
    pub cv2_offset: i32,
    /// Subtracted from CV3.
    pub cv3_offset: i32,
    /// Subtracted from DAC3 codes.
    pub dac3_offset: i32,
}

impl From<CalibrationConfig> for Calibration {
    fn from(c: CalibrationConfig) -> Self {
        Calibration {
            cv1_offset: c.cv1_offset,
            cv2_offset: c.cv2_offset,
            cv3_offset: c.cv3_offset,
            dac3_offset: c.dac3_offset,
        }
    }
}

/// Envelope curve names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlopeConfig {
    /// [`Slope::Linear`]
    #[default]
    Linear,
    /// [`Slope::Exponential`]
    Exponential,
    /// [`Slope::Logarithmic`]
    Logarithmic,
    /// [`Slope::Sigmoid`]
    Sigmoid,
}

impl From<SlopeConfig> for Slope {
    fn from(slope: SlopeConfig) -> Self {
        match slope {
            SlopeConfig::Linear => Slope::Linear,
            SlopeConfig::Exponential => Slope::Exponential,
            SlopeConfig::Logarithmic => Slope::Logarithmic,
            SlopeConfig::Sigmoid => Slope::Sigmoid,
        }
    }
}

/// Wavetable family names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeConfig {
    /// [`FamilyShape::Harmonic`]
    #[default]
    Harmonic,
    /// [`FamilyShape::Pulse`]
    Pulse,
    /// [`FamilyShape::Fold`]
    Fold,
}

impl From<ShapeConfig> for FamilyShape {
    fn from(shape: ShapeConfig) -> Self {
        match shape {
            ShapeConfig::Harmonic => FamilyShape::Harmonic,
            ShapeConfig::Pulse => FamilyShape::Pulse,
            ShapeConfig::Fold => FamilyShape::Fold,
        }
    }
}

/// DAC3 signal names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dac3ModeConfig {
    /// [`Dac3Mode::Phasor`]
    #[default]
    Phasor,
    /// [`Dac3Mode::Contour`]
    Contour,
}

impl From<Dac3ModeConfig> for Dac3Mode {
    fn from(mode: Dac3ModeConfig) -> Self {
        match mode {
            Dac3ModeConfig::Phasor => Dac3Mode::Phasor,
            Dac3ModeConfig::Contour => Dac3Mode::Contour,
        }
    }
}

/// Settings for the envelope module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsrConfig {
    /// Progress curve.
    pub slope: SlopeConfig,
    /// Cycle while the gate is held.
    pub looping: bool,
    /// Sample-and-hold outputs follow the levels.
    pub sh_on: bool,
    /// Attack time knob, 12-bit.
    pub attack: i32,
    /// Transition time knob, 12-bit.
    pub transition: i32,
    /// Sustain level knob, 12-bit.
    pub sustain: i32,
    /// Release time knob, 12-bit.
    pub release: i32,
}

impl Default for AtsrConfig {
    fn default() -> Self {
        let knobs = EnvelopeKnobs::default();
        Self {
            slope: SlopeConfig::default(),
            looping: false,
            sh_on: false,
            attack: knobs.attack,
            transition: knobs.transition,
            sustain: knobs.sustain,
            release: knobs.release,
        }
    }
}

impl AtsrConfig {
    /// Knob block for [`AtsrModule`].
    pub fn knobs(&self) -> EnvelopeKnobs {
        EnvelopeKnobs {
            attack: self.attack,
            transition: self.transition,
            sustain: self.sustain,
            release: self.release,
        }
    }
}

/// Settings for the wavetable module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WavetableConfig {
    /// Family timbre sweep.
    pub shape: ShapeConfig,
    /// Tables in the family.
    pub tables: usize,
    /// Samples per cycle, a power of two.
    pub cycle_len: usize,
    /// DAC3 signal.
    pub dac3_mode: Dac3ModeConfig,
    /// Lock playback to the clock input.
    pub sync_to_clock: bool,
    /// Pitch knob, 12-bit.
    pub pitch: i32,
    /// Morph knob, 12-bit.
    pub morph: i32,
}

impl Default for WavetableConfig {
    fn default() -> Self {
        let knobs = WavetableKnobs::default();
        Self {
            shape: ShapeConfig::default(),
            tables: via_modules::DEFAULT_TABLE_COUNT,
            cycle_len: 512,
            dac3_mode: Dac3ModeConfig::default(),
            sync_to_clock: false,
            pitch: knobs.pitch,
            morph: knobs.morph,
        }
    }
}

/// The `[module]` table, tagged by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleConfig {
    /// Envelope module.
    Atsr(AtsrConfig),
    /// Wavetable module.
    Wavetable(WavetableConfig),
}

impl ModuleConfig {
    /// The `type` string.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Atsr(_) => "atsr",
            Self::Wavetable(_) => "wavetable",
        }
    }
}

fn check_knob(field: &str, value: i32) -> Result<(), ConfigError> {
    if (0..4096).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside 0..=4095")))
    }
}

fn check_offset(field: &str, value: i32, max: i32) -> Result<(), ConfigError> {
    if (-max..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside -{max}..={max}")))
    }
}

fn check_secs(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is not a non-negative time")))
    }
}

impl Patch {
    /// Create a patch with default settings around `module`.
    pub fn new(name: impl Into<String>, module: ModuleConfig) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            duration_secs: default_duration(),
            target: TargetConfig::default(),
            module,
            calibration: CalibrationConfig::default(),
            controls: ControlsConfig::default(),
        }
    }

    /// Create a patch with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the render target.
    pub fn with_target(mut self, target: TargetConfig) -> Self {
        self.target = target;
        self
    }

    /// Set the scripted controls.
    pub fn with_controls(mut self, controls: ControlsConfig) -> Self {
        self.controls = controls;
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let patch: Patch = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), name = %patch.name, "patch loaded");
        Ok(patch)
    }

    /// Load a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), name = %self.name, "patch saved");
        Ok(())
    }

    /// Convert the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field against what the modules accept.
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(ConfigError::invalid(
                "sample_rate",
                format!("{} is outside 1..={MAX_SAMPLE_RATE}", self.sample_rate),
            ));
        }
        if !(self.duration_secs.is_finite()
            && self.duration_secs > 0.0
            && self.duration_secs <= MAX_DURATION_SECS)
        {
            return Err(ConfigError::invalid(
                "duration_secs",
                format!("{} is outside (0, {MAX_DURATION_SECS}]", self.duration_secs),
            ));
        }
        if self.target.kind == TargetKind::Hardware
            && !(1..=MAX_BLOCK_SIZE).contains(&self.target.block_size)
        {
            return Err(ConfigError::invalid(
                "target.block_size",
                format!("{} is outside 1..={MAX_BLOCK_SIZE}", self.target.block_size),
            ));
        }

        match &self.module {
            ModuleConfig::Atsr(atsr) => {
                check_knob("module.attack", atsr.attack)?;
                check_knob("module.transition", atsr.transition)?;
                check_knob("module.sustain", atsr.sustain)?;
                check_knob("module.release", atsr.release)?;
            }
            ModuleConfig::Wavetable(wt) => {
                check_knob("module.pitch", wt.pitch)?;
                check_knob("module.morph", wt.morph)?;
                if !(1..=MAX_TABLES).contains(&wt.tables) {
                    return Err(ConfigError::invalid(
                        "module.tables",
                        format!("{} is outside 1..={MAX_TABLES}", wt.tables),
                    ));
                }
                if !wt.cycle_len.is_power_of_two() || !(8..=65536).contains(&wt.cycle_len) {
                    return Err(ConfigError::invalid(
                        "module.cycle_len",
                        format!("{} is not a power of two in 8..=65536", wt.cycle_len),
                    ));
                }
            }
        }

        let c = &self.calibration;
        check_offset("calibration.cv1_offset", c.cv1_offset, 2047)?;
        check_offset("calibration.cv2_offset", c.cv2_offset, 2047)?;
        check_offset("calibration.cv3_offset", c.cv3_offset, 2047)?;
        check_offset("calibration.dac3_offset", c.dac3_offset, 4095)?;

        let controls = &self.controls;
        check_offset("controls.cv1", controls.cv1, 2047)?;
        check_offset("controls.cv2", controls.cv2, 2047)?;
        check_offset("controls.cv3", controls.cv3, 2047)?;
        check_secs("controls.gate_on_secs", controls.gate_on_secs)?;
        check_secs("controls.gate_off_secs", controls.gate_off_secs)?;
        for (field, period) in [
            ("controls.trigger_period_secs", controls.trigger_period_secs),
            ("controls.clock_period_secs", controls.clock_period_secs),
        ] {
            if let Some(secs) = period {
                check_secs(field, secs)?;
                if secs == 0.0 {
                    return Err(ConfigError::invalid(field, "period must be positive"));
                }
            }
        }
        for (i, sweep) in controls.sweeps.iter().enumerate() {
            check_offset(&format!("controls.sweeps[{i}].from"), sweep.from, 4095)?;
            check_offset(&format!("controls.sweeps[{i}].to"), sweep.to, 4095)?;
        }
        Ok(())
    }

    /// Render target the module is built for.
    pub fn render_target(&self) -> RenderTarget {
        self.target.into()
    }

    /// Render calls per second.
    pub fn tick_rate(&self) -> f64 {
        f64::from(self.sample_rate) / self.render_target().samples_per_call() as f64
    }

    /// Render calls needed to cover `duration_secs`.
    pub fn total_ticks(&self) -> u64 {
        ((self.duration_secs * self.tick_rate()).ceil() as u64).max(1)
    }

    /// Samples per DAC channel the full render produces.
    pub fn total_samples(&self) -> u64 {
        self.total_ticks() * self.render_target().samples_per_call() as u64
    }

    /// Per-tick control inputs for the full render.
    pub fn schedule(&self) -> ControlSchedule {
        ControlSchedule::new(&self.controls, self.tick_rate(), self.total_ticks())
    }

    /// Synthesize the wavetable family this patch plays, if any.
    pub fn family(&self) -> Result<Option<OwnedFamily>, ConfigError> {
        match &self.module {
            ModuleConfig::Atsr(_) => Ok(None),
            ModuleConfig::Wavetable(wt) => Ok(Some(OwnedFamily::synthesize(
                wt.shape.into(),
                wt.tables,
                wt.cycle_len,
            )?)),
        }
    }

    /// Build the module, validating first.
    ///
    /// Wavetable patches borrow `family`, normally the result of
    /// [`Patch::family`].
    pub fn build_module<'a>(
        &self,
        family: Option<&'a OwnedFamily>,
    ) -> Result<Module<'a>, ConfigError> {
        self.validate()?;
        let target = self.render_target();
        let calibration = self.calibration.into();
        let module = match &self.module {
            ModuleConfig::Atsr(atsr) => {
                let mut module = AtsrModule::new(
                    atsr.knobs(),
                    atsr.slope.into(),
                    atsr.looping,
                    target,
                    calibration,
                );
                module.sh_on = atsr.sh_on;
                Module::from(module)
            }
            ModuleConfig::Wavetable(wt) => {
                let owned = family.ok_or_else(|| {
                    ConfigError::invalid("module", "wavetable patch built without a family")
                })?;
                let knobs = WavetableKnobs {
                    pitch: wt.pitch,
                    morph: wt.morph,
                };
                let mut module = WavetableModule::new(
                    owned.family()?,
                    knobs,
                    wt.dac3_mode.into(),
                    target,
                    calibration,
                )?;
                module.sync_to_clock = wt.sync_to_clock;
                Module::from(module)
            }
        };
        tracing::info!(
            name = %self.name,
            module = module.name(),
            ?target,
            ticks = self.total_ticks(),
            "module built"
        );
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWELL: &str = r#"
name = "Slow Swell"
description = "Looping envelope"
duration_secs = 4.0

[target]
kind = "hardware"
block_size = 32

[module]
type = "atsr"
slope = "sigmoid"
looping = true
attack = 3000

[calibration]
dac3_offset = 12
"#;

    #[test]
    fn parses_with_defaults() {
        let patch = Patch::from_toml(SWELL).unwrap();
        assert_eq!(patch.name, "Slow Swell");
        assert_eq!(patch.sample_rate, 48000);
        assert_eq!(patch.duration_secs, 4.0);
        assert_eq!(
            patch.render_target(),
            RenderTarget::Hardware { block_size: 32 }
        );
        let ModuleConfig::Atsr(atsr) = patch.module else {
            panic!("expected atsr module");
        };
        assert_eq!(atsr.slope, SlopeConfig::Sigmoid);
        assert!(atsr.looping);
        assert_eq!(atsr.attack, 3000);
        assert_eq!(atsr.release, EnvelopeKnobs::default().release);
        assert_eq!(patch.calibration.dac3_offset, 12);
        assert_eq!(patch.controls, ControlsConfig::default());
        patch.validate().unwrap();
    }

    #[test]
    fn module_type_is_required() {
        let err = Patch::from_toml("name = \"x\"\n[module]\nslope = \"linear\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn unknown_module_type_is_rejected() {
        assert!(Patch::from_toml("name = \"x\"\n[module]\ntype = \"reverb\"\n").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let patch = Patch::new("Round", ModuleConfig::Wavetable(WavetableConfig::default()))
            .with_description("trip");
        let text = patch.to_toml().unwrap();
        assert!(text.contains("type = \"wavetable\""), "{text}");
        assert_eq!(Patch::from_toml(&text).unwrap(), patch);
    }

    #[test]
    fn tick_accounting() {
        let patch = Patch::from_toml(SWELL).unwrap();
        assert_eq!(patch.tick_rate(), 1500.0);
        assert_eq!(patch.total_ticks(), 6000);
        assert_eq!(patch.total_samples(), 192_000);

        let virt = Patch::new("v", ModuleConfig::Atsr(AtsrConfig::default()));
        assert_eq!(virt.total_ticks(), 96_000);
        assert_eq!(virt.total_samples(), 96_000);
    }

    #[test]
    fn validation_names_the_field() {
        let mut patch = Patch::from_toml(SWELL).unwrap();
        patch.target.block_size = 0;
        let err = patch.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { ref field, .. } if field == "target.block_size"),
            "{err}"
        );

        let mut patch = Patch::new(
            "w",
            ModuleConfig::Wavetable(WavetableConfig {
                cycle_len: 500,
                ..WavetableConfig::default()
            }),
        );
        let err = patch.validate().unwrap_err();
        assert!(err.to_string().contains("module.cycle_len"), "{err}");

        patch.module = ModuleConfig::Wavetable(WavetableConfig::default());
        patch.controls.clock_period_secs = Some(0.0);
        let err = patch.validate().unwrap_err();
        assert!(err.to_string().contains("controls.clock_period_secs"), "{err}");

        patch.controls.clock_period_secs = None;
        patch.sample_rate = 0;
        assert!(patch.validate().is_err());
    }

    #[test]
    fn builds_both_modules() {
        let atsr = Patch::from_toml(SWELL).unwrap();
        assert!(atsr.family().unwrap().is_none());
        let module = atsr.build_module(None).unwrap();
        assert_eq!(module.name(), "atsr");
        assert_eq!(module.target(), RenderTarget::Hardware { block_size: 32 });

        let wt = Patch::new(
            "w",
            ModuleConfig::Wavetable(WavetableConfig {
                tables: 3,
                cycle_len: 64,
                ..WavetableConfig::default()
            }),
        );
        let family = wt.family().unwrap().unwrap();
        assert_eq!(family.family().unwrap().table_count(), 3);
        let module = wt.build_module(Some(&family)).unwrap();
        assert_eq!(module.name(), "wavetable");
    }

    #[test]
    fn wavetable_without_family_fails() {
        let wt = Patch::new("w", ModuleConfig::Wavetable(WavetableConfig::default()));
        let err = wt.build_module(None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "module"));
    }
}
