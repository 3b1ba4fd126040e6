//! Beatcam Script Model
//!
//! Defines the data contracts for camera scripts:
//! - **Beats:** One scripted camera instruction plus its caption
//! - **Camera moves:** Target zoom/focus, transition curve, and transition duration
//! - **Palette:** Section colors keyed by the first character of a beat id
//! - **Script:** Loading and validating an ordered beat list
//!
//! Focus coordinates are percentages `[0, 100]` of the source frame so a
//! script survives resolution changes between recordings.

pub mod beat;
pub mod camera;
pub mod palette;
pub mod script;

pub use beat::*;
pub use camera::*;
pub use palette::*;
pub use script::*;
