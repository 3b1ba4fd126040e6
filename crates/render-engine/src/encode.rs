//! Final delivery encode: intermediate AVI -> H.264 container with optional audio.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Instant;

use beatcam_common::config::EncoderConfig;
use beatcam_common::error::{BeatcamError, BeatcamResult};

use crate::ffmpeg::{command_exists, drain_stderr, join_stderr, stderr_tail};
use crate::progress::{eta, CancelToken, ProgressCallback, RenderProgress, RenderStage};

/// Inputs for one delivery encode.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Rendered video-only intermediate.
    pub intermediate: PathBuf,
    /// Original recording; its first audio stream is muxed when `has_audio`.
    pub source: PathBuf,
    pub has_audio: bool,
    pub output: PathBuf,
    pub total_frames: u64,
    pub duration_secs: f64,
}

/// Trait for encode backends.
pub trait EncodeBackend: Send {
    /// Run the encode to completion. Cancellation stops it early with
    /// [`BeatcamError::Cancelled`].
    fn encode(
        &mut self,
        job: &EncodeJob,
        progress: Option<&ProgressCallback>,
        cancel: &CancelToken,
    ) -> BeatcamResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Encodes with the system `ffmpeg`.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Full ffmpeg argument list for `job`.
    pub fn build_args(&self, job: &EncodeJob) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-nostdin".to_string(),
            "-nostats".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-i".to_string(),
            job.intermediate.display().to_string(),
        ];

        if job.has_audio {
            args.extend([
                "-i".to_string(),
                job.source.display().to_string(),
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                "1:a:0".to_string(),
            ]);
        } else {
            args.extend(["-map".to_string(), "0:v:0".to_string()]);
        }

        args.extend(codec_args_for_config(&self.config));

        if job.has_audio {
            args.extend([
                "-c:a".to_string(),
                self.config.audio_codec.clone(),
                "-shortest".to_string(),
            ]);
        }

        args.push(job.output.display().to_string());
        args
    }
}

impl EncodeBackend for FfmpegEncoder {
    fn encode(
        &mut self,
        job: &EncodeJob,
        progress: Option<&ProgressCallback>,
        cancel: &CancelToken,
    ) -> BeatcamResult<()> {
        let args = self.build_args(job);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let start = Instant::now();
        let mut child = Command::new(&self.config.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BeatcamError::encode(format!("Failed to start {}: {e}", self.config.ffmpeg)))?;

        tracing::info!(
            pid = child.id(),
            output = %job.output.display(),
            has_audio = job.has_audio,
            "ffmpeg encode started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BeatcamError::encode("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BeatcamError::encode("Failed to capture ffmpeg stderr"))?;
        let stderr_task = drain_stderr(stderr, "ffmpeg");

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        let mut state = ProgressState::default();
        loop {
            if cancel.is_cancelled() {
                tracing::warn!(pid = child.id(), "Cancelling ffmpeg encode");
                stop_child(&mut child, stderr_task);
                return Err(BeatcamError::Cancelled);
            }

            buf.clear();
            let bytes = match reader.read_until(b'\n', &mut buf) {
                Ok(bytes) => bytes,
                Err(e) => {
                    let stderr_output = stop_child(&mut child, stderr_task);
                    return Err(BeatcamError::encode(format!(
                        "Failed reading ffmpeg progress: {e}: {}",
                        stderr_tail(&stderr_output)
                    )));
                }
            };
            if bytes == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                if let Some(cb) = progress {
                    cb(progress_report(
                        &state,
                        job.total_frames,
                        job.duration_secs,
                        start.elapsed().as_secs_f64(),
                    ));
                }
            }
        }

        let status = child
            .wait()
            .map_err(|e| BeatcamError::encode(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = join_stderr(Some(stderr_task));

        if !status.success() {
            return Err(BeatcamError::encode(format!(
                "ffmpeg failed (status {status}): {}",
                stderr_tail(&stderr_output)
            )));
        }

        let size = std::fs::metadata(&job.output).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(BeatcamError::encode(format!(
                "{} is missing or empty after ffmpeg: {}",
                job.output.display(),
                stderr_tail(&stderr_output)
            )));
        }

        tracing::info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            size_mb = size as f64 / 1e6,
            "ffmpeg encode finished"
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.config.ffmpeg)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Kill and reap `child` so it can no longer touch the output, returning its stderr.
fn stop_child(child: &mut Child, stderr_task: JoinHandle<String>) -> String {
    let _ = child.kill();
    let _ = child.wait();
    join_stderr(Some(stderr_task))
}

fn codec_args_for_config(config: &EncoderConfig) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-profile:v".to_string(),
        config.profile.clone(),
        "-level".to_string(),
        config.level.clone(),
        "-crf".to_string(),
        config.crf.to_string(),
        "-preset".to_string(),
        config.preset.clone(),
        "-pix_fmt".to_string(),
        config.pix_fmt.clone(),
    ]
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    frame: Option<u64>,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports out_time_ms in microseconds.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "frame" => {
                self.frame = value.parse().ok();
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = match state.frame {
        Some(frame) if total_frames > 0 => frame as f64 / total_frames as f64,
        _ if expected_duration_secs > 0.0 => state.out_time_secs / expected_duration_secs,
        _ => 0.0,
    }
    .clamp(0.0, 1.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_done: state
            .frame
            .unwrap_or_else(|| (progress * total_frames as f64).round() as u64),
        total_frames,
        eta_secs: eta(progress, elapsed_secs),
        beat_id: None,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Encoding
        },
    }
}
