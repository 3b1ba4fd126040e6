//! Shared helpers for the ffmpeg/ffprobe subprocesses.

use std::io::{BufReader, Read};
use std::process::{ChildStderr, Command};
use std::thread::JoinHandle;

/// Characters of encoder diagnostics surfaced in errors.
pub const STDERR_TAIL_CHARS: usize = 2000;

/// Whether `binary` resolves to an executable.
pub fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return std::path::Path::new(binary).is_file();
    }
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Drain a child's stderr on a thread so the child never blocks on a full pipe.
pub(crate) fn drain_stderr(stderr: ChildStderr, tool: &'static str) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read {tool} stderr: {err}>"),
        }
    })
}

/// Collect drained stderr, tolerating a panicked reader thread.
pub(crate) fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string()),
        None => String::new(),
    }
}

/// Last [`STDERR_TAIL_CHARS`] characters of `output`, trimmed.
pub fn stderr_tail(output: &str) -> &str {
    let trimmed = output.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed;
    }
    let skip = count - STDERR_TAIL_CHARS;
    let start = trimmed
        .char_indices()
        .nth(skip)
        .map(|(index, _)| index)
        .unwrap_or(0);
    &trimmed[start..]
}

/// Scratch directory holding shell scripts that stand in for ffmpeg/ffprobe.
#[cfg(all(test, unix))]
pub(crate) struct StubTools {
    pub dir: std::path::PathBuf,
}

#[cfg(all(test, unix))]
impl StubTools {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "beatcam_stub_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    /// Write an executable `sh` script; `$last` holds its final argument.
    pub fn tool(&self, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.join(name);
        let script = format!("#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\n{body}\n");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }
}

#[cfg(all(test, unix))]
impl Drop for StubTools {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
