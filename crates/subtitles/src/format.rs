//! Subtitle generation in SRT and VTT formats.

use std::fmt::Write as _;
use std::path::Path;

use beatcam_common::error::BeatcamResult;

use crate::track::SubtitleEntry;

/// Caption file flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueFormat {
    Srt,
    Vtt,
}

impl CueFormat {
    /// `.vtt` paths get WebVTT, anything else SRT.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => CueFormat::Vtt,
            _ => CueFormat::Srt,
        }
    }

    fn header(self) -> &'static str {
        match self {
            CueFormat::Srt => "",
            CueFormat::Vtt => "WEBVTT\n\n",
        }
    }

    fn timestamp(self, secs: f64) -> String {
        match self {
            CueFormat::Srt => format_srt_time(secs),
            CueFormat::Vtt => format_vtt_time(secs),
        }
    }
}

/// Render `entries` as a complete caption file.
pub fn generate(entries: &[SubtitleEntry], format: CueFormat) -> String {
    let mut output = String::from(format.header());
    for entry in entries {
        push_cue(&mut output, format, entry);
    }
    output
}

/// Generate SRT subtitle content from track entries.
pub fn generate_srt(entries: &[SubtitleEntry]) -> String {
    generate(entries, CueFormat::Srt)
}

/// Generate WebVTT subtitle content from track entries.
pub fn generate_vtt(entries: &[SubtitleEntry]) -> String {
    generate(entries, CueFormat::Vtt)
}

// A blank line ends a cue in both formats, so empty lines inside the caption are dropped.
fn push_cue(output: &mut String, format: CueFormat, entry: &SubtitleEntry) {
    if format == CueFormat::Srt {
        let _ = writeln!(output, "{}", entry.index);
    }
    let _ = writeln!(
        output,
        "{} --> {}",
        format.timestamp(entry.start_secs),
        format.timestamp(entry.end_secs)
    );
    for line in entry.text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        output.push_str(line);
        output.push('\n');
    }
    output.push('\n');
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
pub fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
pub fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

// Rounded to the nearest millisecond; negative and non-finite times clamp to zero.
fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    };
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Save subtitles to a file. `.vtt` paths get WebVTT, anything else SRT.
pub fn save_subtitles(entries: &[SubtitleEntry], path: &Path) -> BeatcamResult<()> {
    std::fs::write(path, generate(entries, CueFormat::for_path(path)))?;
    tracing::info!(path = %path.display(), entries = entries.len(), "Subtitle track written");
    Ok(())
}
