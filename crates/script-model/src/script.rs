//! Camera script loading and validation.
//!
//! A camera script is a JSON array of beats (`camera-script.json`). Order is
//! the only source of timing: each beat owns an equal share of the output.

use std::path::{Path, PathBuf};

use beatcam_common::error::BeatcamError;

use crate::beat::{Beat, Transition};

/// An ordered, validated-on-demand list of beats.
///
/// Beats are immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraScript {
    beats: Vec<Beat>,
}

/// Errors that can occur when loading or validating a camera script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Camera script contains no beats")]
    Empty,

    #[error("Invalid beat #{index} ({id:?}): {reason}")]
    InvalidBeat {
        index: usize,
        id: String,
        reason: String,
    },
}

impl From<ScriptError> for BeatcamError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::IoError { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                BeatcamError::FileNotFound { path }
            }
            other => BeatcamError::script(other.to_string()),
        }
    }
}

impl CameraScript {
    /// Wrap an ordered beat list.
    pub fn new(beats: Vec<Beat>) -> Self {
        Self { beats }
    }

    /// Load a script file. The result is not validated; call [`CameraScript::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ScriptError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let beats: Vec<Beat> = serde_json::from_str(&json).map_err(|e| ScriptError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), beats = beats.len(), "Loaded camera script");
        Ok(Self { beats })
    }

    /// Load and validate in one step.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let script = Self::load(path)?;
        script.validate()?;
        Ok(script)
    }

    /// Parse a script from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            beats: serde_json::from_str(json)?,
        })
    }

    /// Check every beat; the first problem found is returned.
    ///
    /// Unrecognized transition names are accepted (they snap to the target)
    /// but logged.
    pub fn validate(&self) -> Result<(), ScriptError> {
        validate_beats(&self.beats)
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Number of beats that produce a caption.
    pub fn spoken_count(&self) -> usize {
        self.beats.iter().filter(|beat| !beat.is_silent()).count()
    }
}

/// Validate an ordered beat list before any timeline work starts.
pub fn validate_beats(beats: &[Beat]) -> Result<(), ScriptError> {
    if beats.is_empty() {
        return Err(ScriptError::Empty);
    }

    for (index, beat) in beats.iter().enumerate() {
        validate_beat(index, beat)?;
    }

    Ok(())
}

fn validate_beat(index: usize, beat: &Beat) -> Result<(), ScriptError> {
    let invalid = |reason: String| ScriptError::InvalidBeat {
        index,
        id: beat.id.clone(),
        reason,
    };
    let camera = &beat.camera;

    if beat.id.is_empty() {
        return Err(invalid("beat id is empty".to_string()));
    }
    if !camera.zoom.is_finite() || camera.zoom <= 0.0 {
        return Err(invalid(format!("zoom must be > 0, got {}", camera.zoom)));
    }
    for (axis, value) in [("focusX", camera.focus_x), ("focusY", camera.focus_y)] {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(invalid(format!("{axis} must be within 0-100, got {value}")));
        }
    }
    if !camera.duration.is_finite() || camera.duration < 0.0 {
        return Err(invalid(format!(
            "transition duration must be >= 0, got {}",
            camera.duration
        )));
    }
    if let Transition::Unknown(name) = &camera.transition {
        tracing::warn!(
            beat = %beat.id,
            transition = %name,
            "Unrecognized transition; camera will cut to the target"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        { "id": "1a", "script": "Hello",
          "camera": { "zoom": 1, "focusX": 50, "focusY": 50, "transition": "CUT", "duration": 0 } },
        { "id": "1b", "script": "[pause]",
          "camera": { "zoom": 1.5, "focusX": 30, "focusY": 40, "transition": "ease", "duration": 0.5 } },
        { "id": "2a", "script": "World",
          "camera": { "zoom": 2, "focusX": 70, "focusY": 60, "transition": "linear", "duration": 1 } }
    ]"#;

    fn sample() -> CameraScript {
        CameraScript::from_json(SAMPLE).unwrap()
    }

    fn invalid_reason(script: &CameraScript) -> String {
        match script.validate() {
            Err(ScriptError::InvalidBeat { reason, .. }) => reason,
            other => panic!("expected InvalidBeat, got {other:?}"),
        }
    }

    #[test]
    fn test_sample_is_valid() {
        let script = sample();
        assert_eq!(script.len(), 3);
        assert_eq!(script.spoken_count(), 2);
        script.validate().unwrap();
    }

    #[test]
    fn test_empty_script_rejected() {
        let script = CameraScript::new(vec![]);
        assert!(matches!(script.validate(), Err(ScriptError::Empty)));
    }

    #[test]
    fn test_non_positive_zoom_rejected() {
        let mut beats = sample().beats().to_vec();
        beats[1].camera.zoom = 0.0;
        let reason = invalid_reason(&CameraScript::new(beats));
        assert!(reason.contains("zoom"));
    }

    #[test]
    fn test_out_of_range_focus_rejected() {
        let mut beats = sample().beats().to_vec();
        beats[2].camera.focus_y = 100.5;
        let script = CameraScript::new(beats);
        match script.validate() {
            Err(ScriptError::InvalidBeat { index, id, reason }) => {
                assert_eq!(index, 2);
                assert_eq!(id, "2a");
                assert!(reason.contains("focusY"));
            }
            other => panic!("expected InvalidBeat, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_or_nan_duration_rejected() {
        let mut beats = sample().beats().to_vec();
        beats[0].camera.duration = -0.1;
        assert!(invalid_reason(&CameraScript::new(beats.clone())).contains("duration"));

        beats[0].camera.duration = f64::NAN;
        assert!(invalid_reason(&CameraScript::new(beats)).contains("duration"));
    }

    #[test]
    fn test_unknown_transition_is_not_an_error() {
        let mut beats = sample().beats().to_vec();
        beats[1].camera.transition = Transition::from("wobble");
        CameraScript::new(beats).validate().unwrap();
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = CameraScript::load("/nonexistent/beatcam/script.json").unwrap_err();
        assert!(matches!(err, ScriptError::IoError { .. }));
        let top: BeatcamError = err.into();
        assert!(matches!(top, BeatcamError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join("beatcam_test_script_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("camera-script.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let script = CameraScript::load_validated(&path).unwrap();
        assert_eq!(script.beats()[2].id, "2a");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            CameraScript::load(&path),
            Err(ScriptError::ParseError { .. })
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
