//! Frame clock utilities for the fixed output frame grid.
//!
//! Every render maps wall-clock quantities (output duration, transition
//! durations, subtitle times) onto an integer frame grid at a fixed rate.
//! This module keeps those conversions in one place so that the timeline
//! compiler and the render loop round the same way.

/// Largest output frame grid a render may ask for (about 92 hours at 30 fps).
pub const MAX_OUTPUT_FRAMES: usize = 10_000_000;

/// A fixed-rate output clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    fps: f64,
}

impl FrameClock {
    /// Create a clock at `fps` frames per second.
    ///
    /// Returns `None` when `fps` is not a finite positive number.
    pub fn new(fps: f64) -> Option<Self> {
        if fps.is_finite() && fps > 0.0 {
            Some(Self { fps })
        } else {
            None
        }
    }

    /// Frames per second.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Number of whole frames covering `secs` (nearest frame).
    pub fn frames_for_secs(&self, secs: f64) -> usize {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        (secs * self.fps).round() as usize
    }

    /// [`FrameClock::frames_for_secs`], or `None` past [`MAX_OUTPUT_FRAMES`].
    pub fn checked_frames_for_secs(&self, secs: f64) -> Option<usize> {
        let frames = secs * self.fps;
        if frames.is_finite() && frames.round() > MAX_OUTPUT_FRAMES as f64 {
            return None;
        }
        Some(self.frames_for_secs(secs))
    }

    /// Presentation time of `frame` in seconds.
    pub fn secs_at(&self, frame: usize) -> f64 {
        frame as f64 / self.fps
    }

    /// Whether `frame` starts a new output second (status-line cadence).
    pub fn is_second_boundary(&self, frame: usize) -> bool {
        let per_second = (self.fps as usize).max(1);
        frame % per_second == 0
    }
}

/// Parse an ffprobe-style rational rate (`"30000/1001"`, `"25/1"`, `"29.97"`).
pub fn parse_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let value = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}
