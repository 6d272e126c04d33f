//! Factory patches bundled with the library.
//!
//! Each one exercises a different corner of the modules and doubles as a
//! starting point for hand-written patches.

use crate::Patch;

/// TOML content for factory patches, keyed by identifier.
static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("envelope", ENVELOPE_PATCH),
    ("looping_envelope", LOOPING_ENVELOPE_PATCH),
    ("wavetable", WAVETABLE_PATCH),
    ("clocked_wavetable", CLOCKED_WAVETABLE_PATCH),
];

/// Gated envelope on the hardware target.
const ENVELOPE_PATCH: &str = r#"
name = "Envelope"
description = "Half-second gates through a sigmoid ATSR envelope"
sample_rate = 48000
duration_secs = 2.0

[target]
kind = "hardware"
block_size = 32

[module]
type = "atsr"
slope = "sigmoid"
attack = 1000
transition = 1200
sustain = 2600
release = 1400

[controls]
gate_on_secs = 0.5
gate_off_secs = 0.5
"#;

/// Self-cycling envelope used as a slow LFO.
const LOOPING_ENVELOPE_PATCH: &str = r#"
name = "Looping Envelope"
description = "Attack/transition/release cycling while the gate is held"
sample_rate = 48000
duration_secs = 4.0

[module]
type = "atsr"
slope = "exponential"
looping = true
attack = 2400
transition = 2400
release = 2400

[controls]
gate_on_secs = 4.0
gate_off_secs = 0.0
"#;

/// Morph sweep across the harmonic family.
const WAVETABLE_PATCH: &str = r#"
name = "Wavetable"
description = "Harmonic family swept from sine to saw by CV3"
sample_rate = 48000
duration_secs = 3.0

[module]
type = "wavetable"
shape = "harmonic"
pitch = 1800
morph = 0

[controls]
gate_on_secs = 3.0
gate_off_secs = 0.0

[[controls.sweeps]]
cv = "cv3"
from = 0
to = 2047
"#;

/// Clock-locked pulse family with a contour on DAC3.
const CLOCKED_WAVETABLE_PATCH: &str = r#"
name = "Clocked Wavetable"
description = "Pulse family locked to a 100 Hz clock"
sample_rate = 48000
duration_secs = 1.0

[target]
kind = "hardware"
block_size = 16

[module]
type = "wavetable"
shape = "pulse"
tables = 5
cycle_len = 256
dac3_mode = "contour"
sync_to_clock = true
morph = 1024

[controls]
clock_period_secs = 0.01
cv2 = 200
"#;

/// All factory patches.
pub fn factory_patches() -> Vec<Patch> {
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(_, toml)| Patch::from_toml(toml).ok())
        .collect()
}

/// Get a factory patch by identifier or display name, case-insensitively.
pub fn get_factory_patch(name: &str) -> Option<Patch> {
    let name_lower = name.to_lowercase();
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(id, toml)| Some((id, Patch::from_toml(toml).ok()?)))
        .find(|(id, patch)| id.to_lowercase() == name_lower || patch.name.to_lowercase() == name_lower)
        .map(|(_, patch)| patch)
}

/// Identifiers of all factory patches.
pub fn factory_patch_names() -> Vec<&'static str> {
    FACTORY_PATCHES_TOML.iter().map(|(name, _)| *name).collect()
}
