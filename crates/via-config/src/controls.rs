//! Scripted control inputs for offline rendering.
//!
//! A patch cannot turn knobs or patch cables while it renders, so its
//! `[controls]` table describes the inputs as a schedule: constant CV
//! offsets, linear CV sweeps across the whole render, a repeating gate and
//! periodic trigger and clock edges. [`ControlSchedule`] turns that
//! description into one [`ControlInputs`] per render tick.
//!
//! ```toml
//! [controls]
//! cv1 = 0
//! gate_on_secs = 0.25
//! gate_off_secs = 0.25
//! clock_period_secs = 0.5
//!
//! [[controls.sweeps]]
//! cv = "cv3"
//! from = -2047
//! to = 2047
//! ```

use serde::{Deserialize, Serialize};
use via_modules::ControlInputs;

/// A CV input selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CvInput {
    /// CV1.
    Cv1,
    /// CV2.
    Cv2,
    /// CV3.
    Cv3,
}

/// Linear CV ramp from the first tick to the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Input being swept.
    pub cv: CvInput,
    /// Value at the first tick.
    pub from: i32,
    /// Value at the last tick.
    pub to: i32,
}

/// The `[controls]` table of a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Constant CV1 offset.
    pub cv1: i32,
    /// Constant CV2 offset.
    pub cv2: i32,
    /// Constant CV3 offset.
    pub cv3: i32,
    /// Gate high time per gate cycle, in seconds.
    pub gate_on_secs: f64,
    /// Gate low time per gate cycle, in seconds. Zero holds the gate high.
    pub gate_off_secs: f64,
    /// Trigger edge period in seconds, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_period_secs: Option<f64>,
    /// Clock edge period in seconds, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_period_secs: Option<f64>,
    /// CV ramps added on top of the constant offsets.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sweeps: Vec<SweepConfig>,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            cv1: 0,
            cv2: 0,
            cv3: 0,
            gate_on_secs: 0.5,
            gate_off_secs: 0.5,
            trigger_period_secs: None,
            clock_period_secs: None,
            sweeps: Vec::new(),
        }
    }
}

/// Tick-domain version of a [`ControlsConfig`].
#[derive(Debug, Clone)]
pub struct ControlSchedule {
    constant: [i32; 3],
    gate_on_ticks: u64,
    gate_period_ticks: u64,
    trigger_period: Option<u64>,
    clock_period: Option<u64>,
    sweeps: Vec<SweepConfig>,
    total_ticks: u64,
}

/// Seconds to a whole number of ticks, at least one.
fn to_ticks(secs: f64, tick_rate: f64) -> u64 {
    ((secs * tick_rate).round() as u64).max(1)
}

impl ControlSchedule {
    /// Schedule `total_ticks` ticks at `tick_rate` ticks per second.
    pub fn new(controls: &ControlsConfig, tick_rate: f64, total_ticks: u64) -> Self {
        let gate_on_ticks = (controls.gate_on_secs * tick_rate).round() as u64;
        let gate_off_ticks = (controls.gate_off_secs * tick_rate).round() as u64;
        Self {
            constant: [controls.cv1, controls.cv2, controls.cv3],
            gate_on_ticks,
            gate_period_ticks: gate_on_ticks + gate_off_ticks,
            trigger_period: controls.trigger_period_secs.map(|s| to_ticks(s, tick_rate)),
            clock_period: controls.clock_period_secs.map(|s| to_ticks(s, tick_rate)),
            sweeps: controls.sweeps.clone(),
            total_ticks,
        }
    }

    /// Ticks in the schedule.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Inputs for `tick`.
    pub fn inputs_at(&self, tick: u64) -> ControlInputs {
        let mut cv = self.constant;
        let span = self.total_ticks.saturating_sub(1).max(1);
        for sweep in &self.sweeps {
            let from = i64::from(sweep.from);
            let to = i64::from(sweep.to);
            let progress = tick.min(span) as i64;
            let value = from + (to - from) * progress / span as i64;
            let slot = match sweep.cv {
                CvInput::Cv1 => 0,
                CvInput::Cv2 => 1,
                CvInput::Cv3 => 2,
            };
            cv[slot] = cv[slot].saturating_add(value as i32);
        }

        let gate = match self.gate_period_ticks {
            0 => false,
            period => tick % period < self.gate_on_ticks,
        };
        let edge = |period: Option<u64>| period.is_some_and(|p| tick % p == 0);

        ControlInputs {
            cv1: cv[0],
            cv2: cv[1],
            cv3: cv[2],
            gate,
            trigger: edge(self.trigger_period),
            clock: edge(self.clock_period),
        }
    }

    /// Every tick's inputs in order.
    pub fn iter(&self) -> impl Iterator<Item = ControlInputs> + '_ {
        (0..self.total_ticks).map(|tick| self.inputs_at(tick))
    }
}
