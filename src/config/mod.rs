//! Configuration module for the watchgate service.
//!
//! Settings load from a TOML file; secrets resolve from the environment.

mod settings;

pub use settings::*;
