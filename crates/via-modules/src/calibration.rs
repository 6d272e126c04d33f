//! Per-card calibration constants.
//!
//! The values are measured once at the factory and handed to the modules as
//! plain numbers. Reading and writing them from non-volatile storage is not
//! done here.

use via_dsp::saturate_signed;

use crate::io::ControlInputs;

/// Zero-point offsets for the CV inputs and DAC3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calibration {
    /// Subtracted from CV1.
    pub cv1_offset: i32,
    /// Subtracted from CV2.
    pub cv2_offset: i32,
    /// Subtracted from CV3.
    pub cv3_offset: i32,
    /// Subtracted from DAC3 output codes.
    pub dac3_offset: i32,
}

impl Calibration {
    /// Remove the CV offsets, keeping each CV in the bipolar 12-bit range.
    #[inline]
    pub fn apply(&self, inputs: &ControlInputs) -> ControlInputs {
        ControlInputs {
            cv1: saturate_signed(inputs.cv1.wrapping_sub(self.cv1_offset), 12),
            cv2: saturate_signed(inputs.cv2.wrapping_sub(self.cv2_offset), 12),
            cv3: saturate_signed(inputs.cv3.wrapping_sub(self.cv3_offset), 12),
            ..*inputs
        }
    }
}
