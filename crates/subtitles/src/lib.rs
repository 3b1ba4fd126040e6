//! Beatcam Subtitles
//!
//! Caption tracks derived directly from the beat list and the output
//! duration (not from the frame grid):
//! - **Track:** One entry per spoken beat, spanning that beat's equal share of the output
//! - **Formats:** SRT and WebVTT writers

pub mod format;
pub mod track;

pub use format::*;
pub use track::*;
