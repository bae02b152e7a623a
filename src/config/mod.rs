//! Configuration module
//!
//! Global viewer settings, their TOML file and `key=value` overrides.

pub mod settings;

pub use settings::{Settings, Theme};
