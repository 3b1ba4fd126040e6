//! Beat timeline compiler.
//!
//! Maps an ordered beat list onto a fixed output frame grid. Each beat owns
//! one equal-width slice of the grid (see [`SlicePartition`]). At the start of
//! its slice a beat blends from the previous beat's target to its own over a
//! transition window of `round(duration * fps)` frames, then holds.
//!
//! The whole path is computed up front and is read-only during rendering.

use serde::Serialize;

use beatcam_common::clock::FrameClock;
use beatcam_common::error::BeatcamError;
use beatcam_script_model::beat::Beat;
use beatcam_script_model::camera::CameraState;
use beatcam_script_model::script::{validate_beats, ScriptError};

use crate::easing::ease;
use crate::partition::SlicePartition;

/// Camera parameters for one output frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameParams {
    pub zoom: f64,
    pub focus_x: f64,
    pub focus_y: f64,
    /// Index of the beat whose slice contains this frame.
    pub beat_index: usize,
}

impl FrameParams {
    pub fn camera(&self) -> CameraState {
        CameraState::new(self.zoom, self.focus_x, self.focus_y)
    }
}

/// The precomputed per-frame camera path for a whole render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraPath {
    fps: f64,
    frames: Vec<FrameParams>,
}

/// Errors raised while compiling a camera path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("Frame rate must be a finite positive number, got {0}")]
    InvalidFps(f64),

    #[error("Output frame grid is empty (0 frames)")]
    EmptyGrid,
}

impl From<PathError> for BeatcamError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Script(script) => script.into(),
            other => BeatcamError::processing(other.to_string()),
        }
    }
}

impl CameraPath {
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameParams] {
        &self.frames
    }

    pub fn get(&self, frame: usize) -> Option<&FrameParams> {
        self.frames.get(frame)
    }

    /// Active beat for `frame`.
    pub fn beat_index(&self, frame: usize) -> Option<usize> {
        self.frames.get(frame).map(|params| params.beat_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameParams> {
        self.frames.iter()
    }

    /// Output duration covered by the path.
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }
}

/// Compile `beats` into a camera path of exactly `total_frames` frames.
///
/// The beat list is validated in full before any interpolation, so bad input
/// fails here rather than partway through a render.
pub fn build_path(beats: &[Beat], total_frames: usize, fps: f64) -> Result<CameraPath, PathError> {
    validate_beats(beats)?;
    let clock = FrameClock::new(fps).ok_or(PathError::InvalidFps(fps))?;
    if total_frames == 0 {
        return Err(PathError::EmptyGrid);
    }
    let partition = SlicePartition::new(total_frames, beats.len()).ok_or(ScriptError::Empty)?;
    let owners = partition.assignments();

    let mut frames = Vec::with_capacity(total_frames);
    for (index, slice) in partition.iter() {
        let beat = &beats[index];
        let to = beat.target();
        let from = match index {
            0 => to,
            _ => beats[index - 1].target(),
        };

        let transition = &beat.camera.transition;
        let window = if transition.is_snap() || beat.camera.duration == 0.0 {
            0
        } else {
            clock.frames_for_secs(beat.camera.duration)
        };
        if window > slice.len() {
            tracing::debug!(
                beat = %beat.id,
                window,
                slice_frames = slice.len(),
                "Transition is longer than its slice; it will be cut short"
            );
        }

        for (local, frame) in slice.enumerate() {
            let state = if local < window {
                let eased = ease(local as f64 / window as f64, transition);
                CameraState::lerp(&from, &to, eased)
            } else {
                to
            };
            debug_assert_eq!(owners[frame], index);
            frames.push(FrameParams {
                zoom: state.zoom,
                focus_x: state.focus_x,
                focus_y: state.focus_y,
                beat_index: owners[frame],
            });
        }
    }

    tracing::debug!(
        beats = beats.len(),
        frames = frames.len(),
        fps,
        "Compiled camera path"
    );

    Ok(CameraPath { fps, frames })
}
