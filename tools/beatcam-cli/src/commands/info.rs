//! Show source video information.

use std::path::PathBuf;

use beatcam_common::config::AppConfig;
use beatcam_render_engine::source::probe_source;

pub fn run(input: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let info = probe_source(&config.encoder.ffprobe, &input)?;
    let (even_w, even_h) = info.even_dimensions();

    println!("Source: {}", info.path.display());
    println!("  Resolution: {}x{} @ {:.3}fps", info.width, info.height, info.fps);
    if (even_w, even_h) != (info.width, info.height) {
        println!("  Output size: {even_w}x{even_h} (trimmed to even)");
    }
    println!("  Frames: {}", info.frame_count);
    println!("  Duration: {:.2}s", info.duration_secs);
    println!("  Audio: {}", if info.has_audio { "yes" } else { "no" });
    Ok(())
}
