//! Render pipeline: source frames -> camera path -> overlay -> intermediate -> delivery encode.
//!
//! The camera path is compiled in full before the first frame is read.
//! Frames are processed strictly in order; the source reader and the
//! intermediate writer are both order-dependent streams. Any failure ends the
//! run and removes the intermediate and any partial output.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use beatcam_common::clock::{FrameClock, MAX_OUTPUT_FRAMES};
use beatcam_common::config::{AppConfig, EncoderConfig};
use beatcam_common::error::{BeatcamError, BeatcamResult};
use beatcam_processing_core::camera_path::{build_path, CameraPath};
use beatcam_script_model::beat::Beat;
use beatcam_script_model::script::CameraScript;
use beatcam_subtitles::{build_track, save_subtitles};

use crate::encode::{EncodeBackend, EncodeJob, FfmpegEncoder};
use crate::overlay::{discover_font, SubtitleRenderer, SubtitleStyle};
use crate::progress::{CancelToken, ProgressCallback, RenderProgress, RenderStage};
use crate::sink::{FrameSink, MjpegAviWriter, SinkConfig};
use crate::source::{probe_source, FfmpegFrameReader, FrameSource, LoopingReader, SourceInfo};
use crate::transform::{fit_to, transform};

/// How the total output duration is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationMode {
    /// Exactly this many seconds.
    Fixed(f64),
    /// The source recording's own length.
    MatchSource,
}

impl DurationMode {
    /// Output duration in seconds for `source`.
    pub fn resolve(&self, source: &SourceInfo) -> f64 {
        match self {
            DurationMode::Fixed(secs) => *secs,
            DurationMode::MatchSource if source.frame_count > 0 => source.frames_duration_secs(),
            DurationMode::MatchSource => source.duration_secs,
        }
    }
}

/// Run-level render options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output frame rate; `None` matches the source.
    pub fps: Option<f64>,
    pub duration: DurationMode,
    /// Burn captions into the frames.
    pub burn_subtitles: bool,
    /// Also write a subtitle track next to the output.
    pub write_srt: bool,
    pub style: SubtitleStyle,
    /// Caption font; system fonts are searched when unset or missing.
    pub font: Option<PathBuf>,
    /// Write `<output>.render.json` after a successful render.
    pub write_report: bool,
    pub encoder: EncoderConfig,
}

impl RenderOptions {
    /// Options seeded from the user's config file.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fps: None,
            duration: DurationMode::Fixed(config.render.duration_secs),
            burn_subtitles: config.render.burn_subtitles,
            write_srt: false,
            style: SubtitleStyle::from(&config.render),
            font: config.render.subtitle_font.clone(),
            write_report: false,
            encoder: config.encoder.clone(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// A render ready to run.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub input: PathBuf,
    pub script: CameraScript,
    pub output: PathBuf,
    pub options: RenderOptions,
}

/// Output grid derived from the source and the options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderPlan {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
    pub total_frames: usize,
}

/// Resolve the output size, rate, duration, and frame count.
pub fn plan_render(source: &SourceInfo, options: &RenderOptions) -> BeatcamResult<RenderPlan> {
    let fps = options.fps.unwrap_or(source.fps);
    let clock = FrameClock::new(fps)
        .ok_or_else(|| BeatcamError::config(format!("Output fps must be > 0, got {fps}")))?;

    let duration_secs = options.duration.resolve(source);
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(BeatcamError::config(format!(
            "Output duration must be > 0, got {duration_secs}"
        )));
    }

    let total_frames = clock.checked_frames_for_secs(duration_secs).ok_or_else(|| {
        BeatcamError::config(format!(
            "{duration_secs}s at {fps} fps exceeds the {MAX_OUTPUT_FRAMES}-frame limit"
        ))
    })?;
    if total_frames == 0 {
        return Err(BeatcamError::config(format!(
            "{duration_secs}s at {fps} fps is less than one frame"
        )));
    }

    let (width, height) = source.even_dimensions();
    if width == 0 || height == 0 {
        return Err(BeatcamError::source(format!(
            "Source is too small to encode: {}x{}",
            source.width, source.height
        )));
    }

    Ok(RenderPlan {
        width,
        height,
        fps,
        duration_secs,
        total_frames,
    })
}

/// Where the subtitle track for `output` is written.
pub fn subtitle_track_path(output: &Path) -> PathBuf {
    output.with_extension("srt")
}

/// Where the render report for `output` is written.
pub fn report_path(output: &Path) -> PathBuf {
    output.with_extension("render.json")
}

/// Per-process intermediate file next to `output`.
pub fn intermediate_path(output: &Path) -> PathBuf {
    let name = format!("_beatcam_tmp_{}.avi", std::process::id());
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

/// Counters from the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    pub frames: u64,
    pub source_loops: u64,
}

/// Applies a camera path and captions to a stream of source frames.
pub struct FrameRenderer<'a> {
    path: &'a CameraPath,
    beats: &'a [Beat],
    overlay: Option<&'a SubtitleRenderer>,
    output_size: (u32, u32),
}

impl<'a> FrameRenderer<'a> {
    pub fn new(path: &'a CameraPath, beats: &'a [Beat], output_size: (u32, u32)) -> Self {
        Self {
            path,
            beats,
            overlay: None,
            output_size,
        }
    }

    pub fn with_overlay(mut self, overlay: Option<&'a SubtitleRenderer>) -> Self {
        self.overlay = overlay;
        self
    }

    /// Render every frame of the path into `sink`.
    ///
    /// Output frame `f` uses the `f`-th frame read from `reader`, looping the
    /// source when it runs out.
    pub fn run<S: FrameSource>(
        &self,
        reader: &mut LoopingReader<S>,
        sink: &mut dyn FrameSink,
        cancel: &CancelToken,
        progress: Option<&ProgressCallback>,
    ) -> BeatcamResult<FrameStats> {
        let (width, height) = self.output_size;
        let fps = self.path.fps();
        let clock = FrameClock::new(fps)
            .ok_or_else(|| BeatcamError::render(format!("Invalid frame rate {fps}")))?;
        let total = self.path.len() as u64;

        sink.begin(SinkConfig { width, height, fps })?;

        let start = Instant::now();
        for (index, params) in self.path.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(BeatcamError::Cancelled);
            }

            let beat = self.beats.get(params.beat_index).ok_or_else(|| {
                BeatcamError::render(format!(
                    "Frame {index} references missing beat {}",
                    params.beat_index
                ))
            })?;

            let source = reader.next_frame()?;
            let mut frame = fit_to(transform(&source, &params.camera()), width, height);
            if let Some(overlay) = self.overlay {
                overlay.draw(&mut frame, beat);
            }
            sink.push_frame(index, &frame)?;

            if clock.is_second_boundary(index) {
                tracing::debug!(
                    at_secs = clock.secs_at(index),
                    beat = %beat.id,
                    zoom = params.zoom,
                    focus_x = params.focus_x,
                    focus_y = params.focus_y,
                    "Rendering"
                );
                if let Some(cb) = progress {
                    cb(RenderProgress::frames(
                        RenderStage::Rendering,
                        index as u64 + 1,
                        total,
                        start.elapsed().as_secs_f64(),
                        Some(beat.id.clone()),
                    ));
                }
            }
        }

        sink.end()?;

        if let Some(cb) = progress {
            cb(RenderProgress::frames(
                RenderStage::Rendering,
                total,
                total,
                start.elapsed().as_secs_f64(),
                None,
            ));
        }

        Ok(FrameStats {
            frames: total,
            source_loops: reader.loops(),
        })
    }
}

/// Outcome of a successful render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub subtitle_track: Option<PathBuf>,
    pub source: SourceInfo,
    pub plan: RenderPlan,
    pub beats: usize,
    pub captions: usize,
    pub burned_subtitles: bool,
    pub frames: FrameStats,
    pub output_bytes: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

/// Run a render to completion on the current thread.
///
/// Progress is reported through `progress`; `cancel` stops the frame loop
/// or the encode at the next check.
pub fn run_render(
    job: &RenderJob,
    cancel: &CancelToken,
    progress: Option<ProgressCallback>,
) -> BeatcamResult<RenderSummary> {
    let result = execute(job, cancel, progress.as_ref());
    if let (Err(err), Some(cb)) = (&result, &progress) {
        tracing::debug!(error = %err, "Render failed");
        cb(RenderProgress::stage(RenderStage::Failed, 0));
    }
    result
}

fn execute(
    job: &RenderJob,
    cancel: &CancelToken,
    progress: Option<&ProgressCallback>,
) -> BeatcamResult<RenderSummary> {
    let started_at = Utc::now();
    let started = Instant::now();
    let options = &job.options;
    let beats = job.script.beats();

    if let Some(cb) = progress {
        cb(RenderProgress::stage(RenderStage::Preparing, 0));
    }

    job.script.validate()?;
    if options.burn_subtitles {
        options.style.validate()?;
    }

    let source = probe_source(&options.encoder.ffprobe, &job.input)?;
    let plan = plan_render(&source, options)?;
    tracing::info!(
        width = source.width,
        height = source.height,
        fps = source.fps,
        frames = source.frame_count,
        duration_secs = source.frames_duration_secs(),
        "Input"
    );
    tracing::info!(
        width = plan.width,
        height = plan.height,
        fps = plan.fps,
        frames = plan.total_frames,
        duration_secs = plan.duration_secs,
        "Output"
    );

    let overlay = if options.burn_subtitles {
        let font = discover_font(options.font.as_deref()).ok_or_else(|| {
            BeatcamError::config(
                "Burned-in subtitles need a font: pass --sub-font or set render.subtitle_font",
            )
        })?;
        tracing::info!(
            size = options.style.font_size,
            opacity = options.style.opacity,
            font = %font.display(),
            "Subtitles: burned-in"
        );
        Some(SubtitleRenderer::from_font_path(options.style, &font)?)
    } else {
        None
    };

    let track = build_track(beats, plan.duration_secs);
    let subtitle_track = if options.write_srt {
        let path = subtitle_track_path(&job.output);
        save_subtitles(&track, &path)?;
        Some(path)
    } else {
        None
    };

    let camera_path = build_path(beats, plan.total_frames, plan.fps)?;

    let mut encoder = FfmpegEncoder::new(options.encoder.clone());
    if !encoder.is_available() {
        return Err(BeatcamError::unsupported(format!(
            "No supported encode backend found (expected {} in PATH)",
            options.encoder.ffmpeg
        )));
    }
    tracing::info!(backend = encoder.name(), "Using encode backend");

    if let Some(parent) = job.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let intermediate = intermediate_path(&job.output);
    let frames = {
        let mut reader = LoopingReader::new(FfmpegFrameReader::open(&options.encoder.ffmpeg, &source)?);
        let mut writer = MjpegAviWriter::new(
            options.encoder.ffmpeg.clone(),
            &intermediate,
            options.encoder.intermediate_quality,
        );
        let renderer = FrameRenderer::new(&camera_path, beats, (plan.width, plan.height))
            .with_overlay(overlay.as_ref());
        renderer.run(&mut reader, &mut writer, cancel, progress)
    };
    let frames = match frames {
        Ok(frames) => frames,
        Err(err) => {
            remove_file_quietly(&intermediate);
            return Err(err);
        }
    };
    if frames.source_loops > 0 {
        tracing::info!(loops = frames.source_loops, "Source looped to cover the output");
    }

    if !source.has_audio {
        tracing::info!("No audio track found in input");
    }
    let encode_job = EncodeJob {
        intermediate: intermediate.clone(),
        source: job.input.clone(),
        has_audio: source.has_audio,
        output: job.output.clone(),
        total_frames: frames.frames,
        duration_secs: plan.duration_secs,
    };
    if let Some(cb) = progress {
        cb(RenderProgress::stage(RenderStage::Encoding, frames.frames));
    }
    let encoded = encoder.encode(&encode_job, progress, cancel);
    remove_file_quietly(&intermediate);
    if let Err(err) = encoded {
        remove_file_quietly(&job.output);
        return Err(err);
    }

    let output_bytes = std::fs::metadata(&job.output).map(|m| m.len()).unwrap_or(0);
    let summary = RenderSummary {
        input: job.input.clone(),
        output: job.output.clone(),
        subtitle_track,
        source,
        plan,
        beats: beats.len(),
        captions: track.len(),
        burned_subtitles: overlay.is_some(),
        frames,
        output_bytes,
        started_at,
        finished_at: Utc::now(),
        elapsed_secs: started.elapsed().as_secs_f64(),
    };

    if options.write_report {
        write_report(&summary)?;
    }

    tracing::info!(
        output = %summary.output.display(),
        size_mb = output_bytes as f64 / 1e6,
        elapsed_secs = summary.elapsed_secs,
        "Render finished"
    );
    if let Some(cb) = progress {
        cb(RenderProgress::stage(RenderStage::Complete, frames.frames));
    }
    Ok(summary)
}

/// Write `summary` as JSON next to the output.
pub fn write_report(summary: &RenderSummary) -> BeatcamResult<PathBuf> {
    let path = report_path(&summary.output);
    std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;
    tracing::info!(report = %path.display(), "Wrote render report");
    Ok(path)
}

fn remove_file_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed file"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(path = %path.display(), error = %err, "Failed to remove file"),
    }
}

/// Render on a blocking worker, cancelling on Ctrl-C.
///
/// This is the main entry point for rendering.
pub async fn render_video(
    job: RenderJob,
    progress: Option<ProgressCallback>,
) -> BeatcamResult<RenderSummary> {
    tracing::info!(
        input = %job.input.display(),
        output = %job.output.display(),
        beats = job.script.len(),
        "Starting render"
    );

    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let mut worker = tokio::task::spawn_blocking(move || run_render(&job, &worker_cancel, progress));

    let joined = tokio::select! {
        joined = &mut worker => joined,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    tracing::warn!("Interrupt received; cancelling render");
                    cancel.cancel();
                }
                Err(err) => tracing::warn!(error = %err, "Failed to listen for interrupt"),
            }
            worker.await
        }
    };

    joined.map_err(|e| BeatcamError::Other(anyhow::anyhow!("Render worker failed: {e}")))?
}
