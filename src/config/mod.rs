//! Configuration module
//!
//! Handles user configuration (`config.toml` in the platform config dir),
//! layered with `WTS_` environment variables.

mod settings;

pub use settings::*;
