//! Configuration module
//!
//! Handles loading settings from YAML files and environment variables.
//! Settings are read once at startup and treated as immutable afterwards.

mod settings;

pub use settings::*;
