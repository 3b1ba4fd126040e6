//! Camera state: the per-frame zoom and focus point.

use serde::{Deserialize, Serialize};

/// Zoom factor plus focus point (percent of frame size).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    /// Zoom factor (1.0 = no zoom).
    pub zoom: f64,
    /// Horizontal focus, percent [0, 100].
    pub focus_x: f64,
    /// Vertical focus, percent [0, 100].
    pub focus_y: f64,
}

impl CameraState {
    /// Full frame, centered.
    pub const FULL: CameraState = CameraState {
        zoom: 1.0,
        focus_x: 50.0,
        focus_y: 50.0,
    };

    pub fn new(zoom: f64, focus_x: f64, focus_y: f64) -> Self {
        Self {
            zoom,
            focus_x,
            focus_y,
        }
    }

    /// Blend each component independently from `a` toward `b`.
    ///
    /// `t` is clamped to `[0, 1]`; `t == 0` returns `a` exactly.
    pub fn lerp(a: &CameraState, b: &CameraState, t: f64) -> CameraState {
        let t = t.clamp(0.0, 1.0);
        CameraState {
            zoom: a.zoom + (b.zoom - a.zoom) * t,
            focus_x: a.focus_x + (b.focus_x - a.focus_x) * t,
            focus_y: a.focus_y + (b.focus_y - a.focus_y) * t,
        }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::FULL
    }
}
