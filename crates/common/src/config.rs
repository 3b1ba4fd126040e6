//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default render settings.
    pub render: RenderDefaults,

    /// External encoder settings.
    pub encoder: EncoderConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default render parameters, overridable per run from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Total output duration in seconds when the caller does not pick one.
    pub duration_secs: f64,

    /// Whether captions are burned into the frames.
    pub burn_subtitles: bool,

    /// Subtitle font size in pixels.
    pub subtitle_font_size: f32,

    /// Subtitle bar background opacity [0.0, 1.0].
    pub subtitle_opacity: f32,

    /// TrueType/OpenType font used for burned-in captions.
    /// When unset, a list of common system fonts is searched.
    pub subtitle_font: Option<PathBuf>,
}

/// Settings for the ffmpeg/ffprobe collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// ffmpeg binary (name on PATH or absolute path).
    pub ffmpeg: String,

    /// ffprobe binary (name on PATH or absolute path).
    pub ffprobe: String,

    /// x264 constant rate factor.
    pub crf: u32,

    /// x264 preset.
    pub preset: String,

    /// H.264 profile.
    pub profile: String,

    /// H.264 level.
    pub level: String,

    /// Output pixel format.
    pub pix_fmt: String,

    /// Audio codec used when the source has an audio track.
    pub audio_codec: String,

    /// MJPEG quantizer for the intermediate stream (2 = near lossless).
    pub intermediate_quality: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "beatcam=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            burn_subtitles: true,
            subtitle_font_size: 36.0,
            subtitle_opacity: 0.75,
            subtitle_font: None,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            crf: 18,
            preset: "fast".to_string(),
            profile: "baseline".to_string(),
            level: "3.0".to_string(),
            pix_fmt: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            intermediate_quality: 2,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Path of the config file that [`AppConfig::load`] reads.
    pub fn path() -> PathBuf {
        config_file_path()
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("beatcam").join("config.json")
}
