//! Subtitle track timing.

use serde::Serialize;

use beatcam_script_model::beat::Beat;

/// One caption on the subtitle track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleEntry {
    /// Sequence number, starting at 1 with no gaps.
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    pub beat_id: String,
    pub text: String,
}

/// Build the caption track for `beats` over `total_duration` seconds.
///
/// Beat `i` spans `[i * d, (i + 1) * d)` with `d = total_duration / n_beats`.
/// Silent beats keep their time span but produce no entry, so entry numbers
/// are contiguous but do not line up with beat indices.
pub fn build_track(beats: &[Beat], total_duration: f64) -> Vec<SubtitleEntry> {
    if beats.is_empty() || !total_duration.is_finite() || total_duration <= 0.0 {
        return Vec::new();
    }

    let beat_duration = total_duration / beats.len() as f64;
    let entries: Vec<SubtitleEntry> = beats
        .iter()
        .enumerate()
        .filter(|(_, beat)| !beat.is_silent())
        .enumerate()
        .map(|(seq, (i, beat))| SubtitleEntry {
            index: seq + 1,
            start_secs: i as f64 * beat_duration,
            end_secs: (i + 1) as f64 * beat_duration,
            beat_id: beat.id.clone(),
            text: beat.script.clone(),
        })
        .collect();

    tracing::debug!(
        beats = beats.len(),
        entries = entries.len(),
        beat_duration,
        "Built subtitle track"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcam_script_model::beat::{CameraMove, Transition};

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
    fn test_silent_beats_skipped_without_gaps() {
        let beats = vec![beat("1a", "Hello"), beat("1b", "[pause]"), beat("2a", "World")];
        let track = build_track(&beats, 30.0);

        assert_eq!(track.len(), 2);
        assert_eq!(track[0].index, 1);
        assert_eq!(track[0].beat_id, "1a");
        assert_eq!((track[0].start_secs, track[0].end_secs), (0.0, 10.0));
        assert_eq!(track[1].index, 2);
        assert_eq!(track[1].text, "World");
        assert_eq!((track[1].start_secs, track[1].end_secs), (20.0, 30.0));
    }

    #[test]
    fn test_all_silent_gives_empty_track() {
        let beats = vec![beat("1a", "[intro music]"), beat("1b", "[pause]")];
        assert!(build_track(&beats, 12.0).is_empty());
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(build_track(&[], 30.0).is_empty());
        assert!(build_track(&[beat("1a", "Hi")], 0.0).is_empty());
        assert!(build_track(&[beat("1a", "Hi")], f64::NAN).is_empty());
    }

    #[test]
    fn test_empty_caption_is_still_an_entry() {
        let track = build_track(&[beat("1a", "")], 4.0);
        assert_eq!(track.len(), 1);
        assert_eq!(track[0].end_secs, 4.0);
    }
}
