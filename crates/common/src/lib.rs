//! Beatcam Common Utilities
//!
//! Shared infrastructure for all beatcam crates:
//! - Error types and result aliases
//! - Frame clock utilities for mapping seconds onto the output frame grid
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
