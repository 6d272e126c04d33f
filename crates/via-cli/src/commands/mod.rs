//! CLI command implementations.

pub mod example_patch;
pub mod render;
pub mod tables;
