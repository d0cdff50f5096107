//! CLI commands

pub mod synth;
