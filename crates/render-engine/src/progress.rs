//! Render progress reporting and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress callback for rendering.
pub type ProgressCallback = Box<dyn Fn(RenderProgress) + Send>;

/// Render progress report.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Progress within the current stage [0.0, 1.0].
    pub progress: f64,

    /// Frames completed so far.
    pub frames_done: u64,

    /// Total frames in the render.
    pub total_frames: u64,

    /// Estimated time remaining in the current stage, in seconds.
    pub eta_secs: f64,

    /// Beat active on the last completed frame.
    pub beat_id: Option<String>,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Preparing,
    Rendering,
    Encoding,
    Finalizing,
    Complete,
    Failed,
}

impl RenderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderStage::Preparing => "preparing",
            RenderStage::Rendering => "rendering",
            RenderStage::Encoding => "encoding",
            RenderStage::Finalizing => "finalizing",
            RenderStage::Complete => "complete",
            RenderStage::Failed => "failed",
        }
    }
}

impl RenderProgress {
    /// A report for `stage` with no frame counts.
    pub fn stage(stage: RenderStage, total_frames: u64) -> Self {
        let progress = match stage {
            RenderStage::Complete => 1.0,
            _ => 0.0,
        };
        Self {
            progress,
            frames_done: if stage == RenderStage::Complete {
                total_frames
            } else {
                0
            },
            total_frames,
            eta_secs: 0.0,
            beat_id: None,
            stage,
        }
    }

    /// A report for `done` of `total` units of work after `elapsed_secs`.
    pub fn frames(
        stage: RenderStage,
        done: u64,
        total: u64,
        elapsed_secs: f64,
        beat_id: Option<String>,
    ) -> Self {
        let progress = if total == 0 {
            0.0
        } else {
            (done as f64 / total as f64).clamp(0.0, 1.0)
        };
        Self {
            progress,
            frames_done: done,
            total_frames: total,
            eta_secs: eta(progress, elapsed_secs),
            beat_id,
            stage,
        }
    }
}

pub(crate) fn eta(progress: f64, elapsed_secs: f64) -> f64 {
    if progress > 0.0 {
        ((elapsed_secs / progress) - elapsed_secs).max(0.0)
    } else {
        0.0
    }
}

/// Shared flag used to stop a render from another thread.
///
/// Cancellation is one-way; a cancelled token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
