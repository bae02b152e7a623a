//! Utility functions and helpers
//!
//! Application paths and the logging setup shared by the binary and the
//! viewer's log overlay.

pub mod app_paths;
pub mod logging;
