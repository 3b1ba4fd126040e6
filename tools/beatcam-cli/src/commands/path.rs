//! Dump the compiled camera path.

use std::path::PathBuf;

use beatcam_common::clock::{FrameClock, MAX_OUTPUT_FRAMES};
use beatcam_common::config::AppConfig;
use beatcam_processing_core::build_path;

pub fn run(
    script: PathBuf,
    fps: f64,
    duration: Option<f64>,
    output: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let script = super::load_script(&script)?;
    let clock = FrameClock::new(fps).ok_or_else(|| anyhow::anyhow!("fps must be > 0, got {fps}"))?;
    let duration = duration.unwrap_or(config.render.duration_secs);
    let total_frames = clock.checked_frames_for_secs(duration).ok_or_else(|| {
        anyhow::anyhow!("{duration}s at {fps} fps exceeds the {MAX_OUTPUT_FRAMES}-frame limit")
    })?;

    let path = build_path(script.beats(), total_frames, fps)?;
    let json = serde_json::to_string_pretty(&path)?;

    match output {
        Some(output) => {
            std::fs::write(&output, json)?;
            println!(
                "Wrote {} frames ({} beats, {fps} fps) to {}",
                path.len(),
                script.len(),
                output.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
