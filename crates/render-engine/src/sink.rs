//! Consumers of rendered frames.
//!
//! The render loop hands every output frame, in order, to a [`FrameSink`].
//! The production sink streams raw RGB into an `ffmpeg` child that writes
//! an MJPEG AVI intermediate; the final delivery encode happens afterwards.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;

use beatcam_common::error::{BeatcamError, BeatcamResult};

use crate::ffmpeg::{drain_stderr, join_stderr, stderr_tail};

/// Intermediates smaller than this are treated as a failed write.
pub const MIN_INTERMEDIATE_BYTES: u64 = 1000;

/// Stream parameters provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Sink contract for rendered frames.
///
/// `push_frame` is called with strictly increasing frame indices.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> BeatcamResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, index: usize, frame: &RgbImage) -> BeatcamResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> BeatcamResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(usize, RgbImage)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(usize, RgbImage)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> BeatcamResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &RgbImage) -> BeatcamResult<()> {
        self.frames.push((index, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> BeatcamResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes an MJPEG AVI through an `ffmpeg` child fed raw `rgb24` on stdin.
pub struct MjpegAviWriter {
    ffmpeg: String,
    path: PathBuf,
    quality: u32,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<String>>,
    cfg: Option<SinkConfig>,
    last_index: Option<usize>,
}

impl MjpegAviWriter {
    /// `quality` is the MJPEG quantizer (`-q:v`, 2 = best).
    pub fn new(ffmpeg: impl Into<String>, path: impl Into<PathBuf>, quality: u32) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            path: path.into(),
            quality: quality.clamp(1, 31),
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_index: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn build_args(&self, cfg: &SinkConfig) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgb24".to_string(),
            "-s".to_string(),
            format!("{}x{}", cfg.width, cfg.height),
            "-r".to_string(),
            format!("{}", cfg.fps),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            "mjpeg".to_string(),
            "-q:v".to_string(),
            self.quality.to_string(),
            "-pix_fmt".to_string(),
            "yuvj420p".to_string(),
            self.path.display().to_string(),
        ]
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = join_stderr(self.stderr_drain.take());
    }
}

impl FrameSink for MjpegAviWriter {
    fn begin(&mut self, cfg: SinkConfig) -> BeatcamResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(BeatcamError::render("Intermediate width/height must be non-zero"));
        }
        if cfg.width % 2 != 0 || cfg.height % 2 != 0 {
            return Err(BeatcamError::render(format!(
                "Intermediate size must be even, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if !(cfg.fps.is_finite() && cfg.fps > 0.0) {
            return Err(BeatcamError::render(format!("Invalid frame rate {}", cfg.fps)));
        }

        let args = self.build_args(&cfg);
        tracing::debug!(args = ?args, "Starting intermediate writer");
        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BeatcamError::render(format!("Failed to start {}: {e}", self.ffmpeg)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BeatcamError::render("Failed to open intermediate writer stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BeatcamError::render("Failed to capture intermediate writer stderr"))?;

        self.stderr_drain = Some(drain_stderr(stderr, "intermediate writer"));
        self.stdin = Some(stdin);
        self.child = Some(child);
        self.cfg = Some(cfg);
        self.last_index = None;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &RgbImage) -> BeatcamResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| BeatcamError::render("Intermediate writer not started"))?;
        if self.last_index.is_some_and(|last| index <= last) {
            return Err(BeatcamError::render(format!(
                "Intermediate writer received out-of-order frame {index}"
            )));
        }
        if frame.dimensions() != (cfg.width, cfg.height) {
            return Err(BeatcamError::render(format!(
                "Frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(BeatcamError::render("Intermediate writer is already finalized"));
        };
        if let Err(err) = stdin.write_all(frame.as_raw()) {
            // A broken pipe means ffmpeg died; its stderr says why.
            drop(self.stdin.take());
            let stderr = match self.child.take() {
                Some(mut child) => {
                    let _ = child.wait();
                    join_stderr(self.stderr_drain.take())
                }
                None => String::new(),
            };
            return Err(BeatcamError::render(format!(
                "Failed to write frame {index} to intermediate: {err}: {}",
                stderr_tail(&stderr)
            )));
        }
        self.last_index = Some(index);
        Ok(())
    }

    fn end(&mut self) -> BeatcamResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| BeatcamError::render("Intermediate writer not started"))?;

        let status = child
            .wait()
            .map_err(|e| BeatcamError::render(format!("Failed to wait on intermediate writer: {e}")))?;
        let stderr = join_stderr(self.stderr_drain.take());

        if !status.success() {
            return Err(BeatcamError::render(format!(
                "Intermediate writer failed (status {status}): {}",
                stderr_tail(&stderr)
            )));
        }

        verify_intermediate(&self.path)?;
        Ok(())
    }
}

impl Drop for MjpegAviWriter {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Check that an intermediate file exists and is plausibly non-empty.
pub fn verify_intermediate(path: &Path) -> BeatcamResult<u64> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size < MIN_INTERMEDIATE_BYTES {
        return Err(BeatcamError::render(format!(
            "Intermediate {} is empty or truncated ({size} bytes)",
            path.display()
        )));
    }
    tracing::info!(
        path = %path.display(),
        size_mb = size as f64 / 1e6,
        "Intermediate written"
    );
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_in_memory_sink_captures_frames() {
        let mut sink = InMemorySink::new();
        let cfg = SinkConfig {
            width: 2,
            height: 2,
            fps: 30.0,
        };
        sink.begin(cfg).unwrap();
        sink.push_frame(0, &RgbImage::from_pixel(2, 2, Rgb([1, 2, 3]))).unwrap();
        sink.push_frame(1, &RgbImage::from_pixel(2, 2, Rgb([4, 5, 6]))).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.config(), Some(cfg));
        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.frames()[1].1.get_pixel(1, 1).0, [4, 5, 6]);
        assert!(sink.is_finished());
    }

    #[test]
    fn test_writer_args() {
        let writer = MjpegAviWriter::new("ffmpeg", "/tmp/_beatcam_tmp_1.avi", 2);
        let args = writer.build_args(&SinkConfig {
            width: 1920,
            height: 1080,
            fps: 29.97,
        });
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgb24 -s 1920x1080 -r 29.97 -i pipe:0"));
        assert!(joined.contains("-c:v mjpeg -q:v 2"));
        assert!(joined.ends_with("/tmp/_beatcam_tmp_1.avi"));
    }

    #[test]
    fn test_writer_rejects_odd_size() {
        let mut writer = MjpegAviWriter::new("ffmpeg", "/tmp/unused.avi", 2);
        let err = writer
            .begin(SinkConfig {
                width: 1921,
                height: 1080,
                fps: 30.0,
            })
            .unwrap_err();
        assert!(err.to_string().contains("even"));
    }

    #[test]
    fn test_push_before_begin_fails() {
        let mut writer = MjpegAviWriter::new("ffmpeg", "/tmp/unused.avi", 2);
        let frame = RgbImage::new(2, 2);
        assert!(writer.push_frame(0, &frame).is_err());
    }

    #[test]
    fn test_verify_intermediate_rejects_tiny_files() {
        let dir = std::env::temp_dir().join("beatcam_test_verify_intermediate");
        std::fs::create_dir_all(&dir).unwrap();

        let tiny = dir.join("tiny.avi");
        std::fs::write(&tiny, [0u8; 10]).unwrap();
        assert!(verify_intermediate(&tiny).is_err());
        assert!(verify_intermediate(&dir.join("missing.avi")).is_err());

        let ok = dir.join("ok.avi");
        std::fs::write(&ok, vec![0u8; 4096]).unwrap();
        assert_eq!(verify_intermediate(&ok).unwrap(), 4096);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    fn write_two_frames(ffmpeg: String, path: &Path) -> BeatcamResult<()> {
        let mut writer = MjpegAviWriter::new(ffmpeg, path, 2);
        writer.begin(SinkConfig {
            width: 4,
            height: 4,
            fps: 10.0,
        })?;
        writer.push_frame(0, &RgbImage::new(4, 4))?;
        writer.push_frame(1, &RgbImage::new(4, 4))?;
        writer.end()
    }

    #[cfg(unix)]
    #[test]
    fn test_writer_end_reports_failed_exit() {
        let tools = crate::ffmpeg::StubTools::new("writer_status");
        let ffmpeg = tools.tool(
            "ffmpeg",
            "cat >/dev/null\necho 'mjpeg: out of memory' >&2\nexit 1",
        );

        let err = write_two_frames(ffmpeg, &tools.dir.join("out.avi")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Intermediate writer failed"), "{message}");
        assert!(message.contains("mjpeg: out of memory"), "{message}");
    }

    #[cfg(unix)]
    #[test]
    fn test_writer_end_rejects_truncated_output() {
        let tools = crate::ffmpeg::StubTools::new("writer_truncated");
        let ffmpeg = tools.tool("ffmpeg", "cat >/dev/null\nprintf x > \"$last\"");

        let err = write_two_frames(ffmpeg, &tools.dir.join("out.avi")).unwrap_err();
        assert!(err.to_string().contains("empty or truncated"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn test_writer_accepts_complete_output() {
        let tools = crate::ffmpeg::StubTools::new("writer_ok");
        let ffmpeg = tools.tool(
            "ffmpeg",
            "cat >/dev/null\nhead -c 4096 /dev/zero > \"$last\"",
        );

        let path = tools.dir.join("out.avi");
        write_two_frames(ffmpeg, &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    }
}
