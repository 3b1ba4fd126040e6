//! Beatcam Processing Core: Beat Timeline Compiler
//!
//! Turns an ordered beat list into a per-frame camera path:
//! - **Easing:** Cubic-Bézier timing curves solved numerically
//! - **Partition:** Equal-width slicing of the frame grid, one slice per beat
//! - **Camera Path:** Per-frame zoom/focus/beat-index, fully precomputed
//!
//! This crate is pure computation: no I/O, no subprocesses.
//! All inputs are data; all outputs are data.

pub mod camera_path;
pub mod easing;
pub mod partition;

pub use camera_path::{build_path, CameraPath, FrameParams, PathError};
pub use easing::{ease, CubicBezier};
pub use partition::SlicePartition;
