//! Beat and camera move types.
//!
//! A beat is one scripted camera instruction exported by the teleprompter:
//!
//! ```json
//! {
//!   "id": "2a",
//!   "script": "Open the settings panel",
//!   "camera": { "zoom": 1.8, "focusX": 72, "focusY": 30,
//!               "transition": "ease-in-out", "duration": 0.6 }
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::CameraState;
use crate::palette::{section_color, Rgb8};

/// Marker that flags a caption as silent (stage direction, not spoken).
pub const SILENT_MARKER: char = '[';

/// One timed camera + caption instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Beat identifier; its first character selects the section color.
    pub id: String,

    /// Caption text. A leading `[` marks the beat as silent.
    #[serde(default)]
    pub script: String,

    /// Camera target and the transition used to reach it.
    pub camera: CameraMove,
}

/// Camera target for a beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraMove {
    /// Zoom factor (1.0 = full frame, 2.0 = half-width crop).
    pub zoom: f64,

    /// Horizontal focus, percent of frame width [0, 100].
    pub focus_x: f64,

    /// Vertical focus, percent of frame height [0, 100].
    pub focus_y: f64,

    /// Curve used to move from the previous beat's target to this one.
    pub transition: Transition,

    /// Transition length in seconds.
    pub duration: f64,
}

/// Named easing curve, or an instant cut.
///
/// Names follow the CSS timing-function keywords used by the teleprompter.
/// Unrecognized names are preserved and behave like [`Transition::Cut`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Transition {
    Linear,
    Ease,
    EaseIn,
    EaseOut,
    EaseInOut,
    Cut,
    Hold,
    Unknown(String),
}

impl Beat {
    /// Whether the caption is suppressed from burned-in and track subtitles.
    pub fn is_silent(&self) -> bool {
        self.script.starts_with(SILENT_MARKER)
    }

    /// Display color for this beat's section.
    pub fn section_color(&self) -> Rgb8 {
        section_color(&self.id)
    }

    /// Camera values this beat settles on.
    pub fn target(&self) -> CameraState {
        CameraState::new(self.camera.zoom, self.camera.focus_x, self.camera.focus_y)
    }
}

impl Transition {
    /// Name as written in camera scripts.
    pub fn as_str(&self) -> &str {
        match self {
            Transition::Linear => "linear",
            Transition::Ease => "ease",
            Transition::EaseIn => "ease-in",
            Transition::EaseOut => "ease-out",
            Transition::EaseInOut => "ease-in-out",
            Transition::Cut => "CUT",
            Transition::Hold => "HOLD",
            Transition::Unknown(name) => name,
        }
    }

    /// Whether this transition jumps straight to the target with no blend.
    pub fn is_snap(&self) -> bool {
        matches!(
            self,
            Transition::Cut | Transition::Hold | Transition::Unknown(_)
        )
    }
}

impl From<String> for Transition {
    fn from(name: String) -> Self {
        match name.as_str() {
            "linear" => Transition::Linear,
            "ease" => Transition::Ease,
            "ease-in" => Transition::EaseIn,
            "ease-out" => Transition::EaseOut,
            "ease-in-out" => Transition::EaseInOut,
            "CUT" => Transition::Cut,
            "HOLD" => Transition::Hold,
            _ => Transition::Unknown(name),
        }
    }
}

impl From<&str> for Transition {
    fn from(name: &str) -> Self {
        Transition::from(name.to_string())
    }
}

impl From<Transition> for String {
    fn from(transition: Transition) -> Self {
        transition.as_str().to_string()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beat(id: &str, script: &str) -> Beat {
        Beat {
            id: id.to_string(),
            script: script.to_string(),
            camera: CameraMove {
                zoom: 1.0,
                focus_x: 50.0,
                focus_y: 50.0,
                transition: Transition::Cut,
                duration: 0.0,
            },
        }
    }

    #[test]
    fn test_silent_marker() {
        assert!(beat("1b", "[pause]").is_silent());
        assert!(!beat("1a", "Hello [world]").is_silent());
        assert!(!beat("1a", "").is_silent());
    }

    #[test]
    fn test_deserialize_camel_case_camera() {
        let json = r#"{
            "id": "3c",
            "script": "Zoom on the toolbar",
            "camera": { "zoom": 2.0, "focusX": 25, "focusY": 10,
                        "transition": "ease-out", "duration": 0.5 }
        }"#;
        let beat: Beat = serde_json::from_str(json).unwrap();
        assert_eq!(beat.camera.transition, Transition::EaseOut);
        assert!((beat.camera.focus_x - 25.0).abs() < 1e-12);
        assert_eq!(beat.target(), CameraState::new(2.0, 25.0, 10.0));
    }

    #[test]
    fn test_missing_script_defaults_to_empty() {
        let json = r#"{ "id": "1a", "camera": { "zoom": 1, "focusX": 50, "focusY": 50,
                        "transition": "CUT", "duration": 0 } }"#;
        let beat: Beat = serde_json::from_str(json).unwrap();
        assert_eq!(beat.script, "");
        assert!(!beat.is_silent());
    }

    #[test]
    fn test_transition_names_round_trip_through_strings() {
        for name in ["linear", "ease", "ease-in", "ease-out", "ease-in-out", "CUT", "HOLD"] {
            let transition = Transition::from(name);
            assert!(!matches!(transition, Transition::Unknown(_)), "{name}");
            assert_eq!(transition.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_transition_is_preserved_and_snaps() {
        let transition: Transition = serde_json::from_str("\"bounce\"").unwrap();
        assert_eq!(transition, Transition::Unknown("bounce".to_string()));
        assert!(transition.is_snap());
        assert_eq!(serde_json::to_string(&transition).unwrap(), "\"bounce\"");

        // Names are case sensitive, like the CSS keywords they mirror.
        assert!(Transition::from("cut").is_snap());
        assert!(matches!(Transition::from("Linear"), Transition::Unknown(_)));
    }
}
