//! Beatcam Render Engine
//!
//! Offline renderer that replays a camera script over a screen recording:
//! every output frame is cropped and scaled per the compiled camera path,
//! optionally captioned, and the result is encoded for delivery.
//!
//! # Pipeline Architecture
//!
//! ```text
//! input.mp4 ──┐
//!             ├── probe (ffprobe) ── plan (even size, fps, frame count)
//! script ─────┤                              │
//!             ├── camera path ───────────────┤
//!             │                              ▼
//!             │              decode (looping) ─► crop/scale ─► caption bar
//!             │                                                   │
//!             └── subtitle track (.srt)                           ▼
//!                                                   MJPEG intermediate (.avi)
//!                                                                 │
//!                                       input audio ──► encode (H.264 + AAC)
//!                                                                 │
//!                                                                 ▼
//!                                                            output.mp4
//! ```

pub mod encode;
pub mod ffmpeg;
pub mod overlay;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod source;
pub mod transform;

pub use encode::{EncodeBackend, EncodeJob, FfmpegEncoder};
pub use overlay::{SubtitleRenderer, SubtitleStyle};
pub use pipeline::*;
pub use progress::{CancelToken, ProgressCallback, RenderProgress, RenderStage};
pub use sink::{FrameSink, InMemorySink, MjpegAviWriter, SinkConfig};
pub use source::{FrameSource, LoopingReader, MemorySource, SourceInfo};
