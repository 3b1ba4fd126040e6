//! Write a subtitle track without rendering.

use std::path::PathBuf;

use beatcam_common::config::AppConfig;
use beatcam_subtitles::{build_track, save_subtitles};

pub fn run(
    script: PathBuf,
    output: PathBuf,
    duration: Option<f64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let script = super::load_script(&script)?;
    let duration = duration.unwrap_or(config.render.duration_secs);
    if !(duration.is_finite() && duration > 0.0) {
        return Err(anyhow::anyhow!("Duration must be > 0, got {duration}"));
    }

    let track = build_track(script.beats(), duration);
    save_subtitles(&track, &output)?;

    println!(
        "Wrote {} captions ({} silent beats skipped) over {duration}s to {}",
        track.len(),
        script.len() - track.len(),
        output.display()
    );
    Ok(())
}
