//! The render interface shared by every module.

use crate::atsr::AtsrModule;
use crate::io::{ControlInputs, Outputs, RenderTarget};
use crate::wavetable::WavetableModule;

/// One tick of a voice module.
///
/// Each call consumes one set of control inputs and writes
/// [`RenderTarget::samples_per_call`] samples to every DAC channel of
/// `outputs`, starting at `write_position`. Samples outside that window
/// are left untouched, so a driver can render the two halves of a DAC ring
/// buffer alternately.
///
/// # Panics
///
/// Panics if `write_position + samples_per_call` exceeds `outputs.len()`.
pub trait Render {
    /// Consume `inputs` and write one block.
    fn render(&mut self, write_position: usize, inputs: &ControlInputs, outputs: &mut Outputs);
}

/// Every module a card can run.
#[derive(Debug, Clone)]
pub enum Module<'a> {
    /// Attack / transition / sustain / release envelope.
    Envelope(AtsrModule),
    /// Spline wavetable voice.
    Wavetable(WavetableModule<'a>),
}

impl Module<'_> {
    /// Render target the module was built for.
    pub fn target(&self) -> RenderTarget {
        match self {
            Self::Envelope(m) => m.target(),
            Self::Wavetable(m) => m.target(),
        }
    }

    /// Short display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Envelope(_) => "atsr",
            Self::Wavetable(_) => "wavetable",
        }
    }
}

impl Render for Module<'_> {
    #[inline]
    fn render(&mut self, write_position: usize, inputs: &ControlInputs, outputs: &mut Outputs) {
        match self {
            Self::Envelope(m) => m.render(write_position, inputs, outputs),
            Self::Wavetable(m) => m.render(write_position, inputs, outputs),
        }
    }
}

impl From<AtsrModule> for Module<'_> {
    fn from(module: AtsrModule) -> Self {
        Self::Envelope(module)
    }
}

impl<'a> From<WavetableModule<'a>> for Module<'a> {
    fn from(module: WavetableModule<'a>) -> Self {
        Self::Wavetable(module)
    }
}
