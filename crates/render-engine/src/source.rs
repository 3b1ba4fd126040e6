//! Source video probing and sequential frame reading.
//!
//! Frames are decoded by an `ffmpeg` child writing raw `rgb24` to stdout.
//! Rewinding restarts the decoder. [`LoopingReader`] turns exhaustion into a
//! rewind so short recordings can back a longer output.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use beatcam_common::clock::parse_rate;
use beatcam_common::error::{BeatcamError, BeatcamResult};

use crate::ffmpeg::{drain_stderr, join_stderr, stderr_tail};

/// Properties of a source recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Native frame rate.
    pub fps: f64,
    /// Native frame count (estimated from duration when the container omits it).
    pub frame_count: u64,
    pub duration_secs: f64,
    pub has_audio: bool,
}

impl SourceInfo {
    /// Size rounded down to even numbers, as required by yuv420p H.264.
    pub fn even_dimensions(&self) -> (u32, u32) {
        (self.width & !1, self.height & !1)
    }

    /// Length implied by the frame count and rate.
    pub fn frames_duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.fps
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe a source file with `ffprobe`.
///
/// An unreadable file, or one without a decodable video stream, is an error.
pub fn probe_source(ffprobe: &str, path: &Path) -> BeatcamResult<SourceInfo> {
    if !path.exists() {
        return Err(BeatcamError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| BeatcamError::source(format!("Failed to run {ffprobe}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BeatcamError::source(format!(
            "Cannot open {} ({}): {}",
            path.display(),
            output.status,
            stderr_tail(&stderr)
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&raw, path)?;
    tracing::debug!(
        path = %path.display(),
        width = info.width,
        height = info.height,
        fps = info.fps,
        frames = info.frame_count,
        has_audio = info.has_audio,
        "Probed source"
    );
    Ok(info)
}

/// Interpret `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_output(json: &str, path: &Path) -> BeatcamResult<SourceInfo> {
    let probe: ProbeOutput = serde_json::from_str(json)?;
    let invalid = |what: &str| BeatcamError::source(format!("{}: {what}", path.display()));

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| invalid("no video stream"))?;
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let width = video.width.filter(|w| *w > 0).ok_or_else(|| invalid("missing width"))?;
    let height = video.height.filter(|h| *h > 0).ok_or_else(|| invalid("missing height"))?;
    let fps = [&video.avg_frame_rate, &video.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|rate| parse_rate(rate))
        .ok_or_else(|| invalid("unknown frame rate"))?;

    let duration_secs = video
        .duration
        .as_deref()
        .or(probe.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    let frame_count = video
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| duration_secs.map(|d| (d * fps).round() as u64))
        .unwrap_or(0);

    Ok(SourceInfo {
        path: path.to_path_buf(),
        width,
        height,
        fps,
        frame_count,
        duration_secs: duration_secs.unwrap_or(frame_count as f64 / fps),
        has_audio,
    })
}

/// A sequential, rewindable stream of RGB frames.
pub trait FrameSource: Send {
    /// Frame size in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Next frame, or `None` when the stream is exhausted.
    fn read_frame(&mut self) -> BeatcamResult<Option<RgbImage>>;

    /// Restart from the first frame.
    fn rewind(&mut self) -> BeatcamResult<()>;
}

/// Decodes a video file through an `ffmpeg` child process.
pub struct FfmpegFrameReader {
    ffmpeg: String,
    path: PathBuf,
    width: u32,
    height: u32,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<String>>,
    frames_read: u64,
}

impl FfmpegFrameReader {
    /// Start decoding `info.path`.
    pub fn open(ffmpeg: &str, info: &SourceInfo) -> BeatcamResult<Self> {
        let mut reader = Self {
            ffmpeg: ffmpeg.to_string(),
            path: info.path.clone(),
            width: info.width,
            height: info.height,
            child: None,
            stdout: None,
            stderr_drain: None,
            frames_read: 0,
        };
        reader.spawn()?;
        Ok(reader)
    }

    fn spawn(&mut self) -> BeatcamResult<()> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-nostdin", "-v", "error", "-i"])
            .arg(&self.path)
            .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BeatcamError::source(format!("Failed to start {}: {e}", self.ffmpeg)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BeatcamError::source("Failed to capture decoder stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BeatcamError::source("Failed to capture decoder stderr"))?;

        tracing::debug!(pid = child.id(), path = %self.path.display(), "Decoder started");
        self.stderr_drain = Some(drain_stderr(stderr, "decoder"));
        self.stdout = Some(stdout);
        self.child = Some(child);
        self.frames_read = 0;
        Ok(())
    }

    fn shutdown(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = join_stderr(self.stderr_drain.take());
    }

    // Called once stdout hits EOF; a decoder that produced nothing and failed
    // means the source is unreadable.
    fn finish(&mut self) -> BeatcamResult<()> {
        drop(self.stdout.take());
        let status = match self.child.take() {
            Some(mut child) => Some(
                child
                    .wait()
                    .map_err(|e| BeatcamError::source(format!("Failed to wait on decoder: {e}")))?,
            ),
            None => None,
        };
        let stderr = join_stderr(self.stderr_drain.take());

        match status {
            Some(status) if !status.success() && self.frames_read == 0 => {
                Err(BeatcamError::source(format!(
                    "Decoder failed on {} ({status}): {}",
                    self.path.display(),
                    stderr_tail(&stderr)
                )))
            }
            _ => Ok(()),
        }
    }
}

impl FrameSource for FfmpegFrameReader {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> BeatcamResult<Option<RgbImage>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
        match stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                self.finish()?;
                return Ok(None);
            }
            Err(err) => {
                return Err(BeatcamError::source(format!(
                    "Failed reading frame {} from {}: {err}",
                    self.frames_read,
                    self.path.display()
                )))
            }
        }

        self.frames_read += 1;
        RgbImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| BeatcamError::source("Decoded frame has the wrong size"))
    }

    fn rewind(&mut self) -> BeatcamResult<()> {
        self.shutdown();
        self.spawn()
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Frames held in memory. Used by tests and for short generated clips.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<RgbImage>,
    cursor: usize,
    dimensions: (u32, u32),
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        let dimensions = frames.first().map(|f| f.dimensions()).unwrap_or((0, 0));
        Self {
            frames,
            cursor: 0,
            dimensions,
        }
    }
}

impl FrameSource for MemorySource {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn read_frame(&mut self) -> BeatcamResult<Option<RgbImage>> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }

    fn rewind(&mut self) -> BeatcamResult<()> {
        self.cursor = 0;
        Ok(())
    }
}

/// Wraps a [`FrameSource`] so that exhaustion loops back to the first frame.
pub struct LoopingReader<S: FrameSource> {
    inner: S,
    loops: u64,
}

impl<S: FrameSource> LoopingReader<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, loops: 0 }
    }

    /// Next frame, rewinding once when the source runs out.
    ///
    /// A source that yields nothing right after a rewind is a read failure.
    pub fn next_frame(&mut self) -> BeatcamResult<RgbImage> {
        if let Some(frame) = self.inner.read_frame()? {
            return Ok(frame);
        }

        self.inner.rewind()?;
        self.loops += 1;
        tracing::debug!(loops = self.loops, "Source exhausted; looping to first frame");
        self.inner
            .read_frame()?
            .ok_or_else(|| BeatcamError::source("Source produced no frames after rewinding"))
    }

    /// Times the source has wrapped around.
    pub fn loops(&self) -> u64 {
        self.loops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn numbered_frames(count: u8) -> Vec<RgbImage> {
        (0..count)
            .map(|i| RgbImage::from_pixel(4, 2, Rgb([i, 0, 0])))
            .collect()
    }

    #[test]
    fn test_looping_sequence() {
        let mut reader = LoopingReader::new(MemorySource::new(numbered_frames(3)));
        let sequence: Vec<u8> = (0..7)
            .map(|_| reader.next_frame().unwrap().get_pixel(0, 0).0[0])
            .collect();
        assert_eq!(sequence, vec![0, 1, 2, 0, 1, 2, 0]);
        assert_eq!(reader.loops(), 2);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let mut reader = LoopingReader::new(MemorySource::new(vec![]));
        assert!(reader.next_frame().is_err());
    }

    #[test]
    fn test_parse_probe_with_audio() {
        let json = r#"{
            "streams": [
                { "index": 0, "codec_type": "video", "width": 1921, "height": 1081,
                  "r_frame_rate": "30/1", "avg_frame_rate": "30000/1001",
                  "nb_frames": "450", "duration": "15.015000" },
                { "index": 1, "codec_type": "audio", "sample_rate": "48000" }
            ],
            "format": { "duration": "15.020000" }
        }"#;
        let info = parse_probe_output(json, Path::new("demo.mp4")).unwrap();
        assert_eq!((info.width, info.height), (1921, 1081));
        assert_eq!(info.even_dimensions(), (1920, 1080));
        assert!((info.fps - 29.97).abs() < 0.01);
        assert_eq!(info.frame_count, 450);
        assert!((info.duration_secs - 15.015).abs() < 1e-9);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_estimates_frame_count() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "width": 1280, "height": 720,
                  "avg_frame_rate": "0/0", "r_frame_rate": "25/1" }
            ],
            "format": { "duration": "4.000000" }
        }"#;
        let info = parse_probe_output(json, Path::new("screen.webm")).unwrap();
        assert_eq!(info.fps, 25.0);
        assert_eq!(info.frame_count, 100);
        assert!(!info.has_audio);
    }

    #[test]
    fn test_parse_probe_without_video_fails() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ] }"#;
        let err = parse_probe_output(json, Path::new("voice.m4a")).unwrap_err();
        assert!(err.to_string().contains("no video stream"));
    }

    #[test]
    fn test_probe_missing_file() {
        let err = probe_source("ffprobe", Path::new("/nonexistent/beatcam/input.mp4")).unwrap_err();
        assert!(matches!(err, BeatcamError::FileNotFound { .. }));
    }
}
