//! Check external tools and subtitle fonts.

use beatcam_common::config::AppConfig;
use beatcam_render_engine::encode::{EncodeBackend, FfmpegEncoder};
use beatcam_render_engine::ffmpeg::command_exists;
use beatcam_render_engine::overlay::discover_font;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("beatcam System Check");
    println!("{}", "=".repeat(50));

    let encoder = FfmpegEncoder::new(config.encoder.clone());
    let ffmpeg_ok = encoder.is_available();
    let ffprobe_ok = command_exists(&config.encoder.ffprobe);
    report(ffmpeg_ok, &format!("{}: {}", encoder.name(), config.encoder.ffmpeg));
    report(ffprobe_ok, &format!("ffprobe: {}", config.encoder.ffprobe));

    let font = discover_font(config.render.subtitle_font.as_deref());
    match &font {
        Some(path) => println!("[OK] Subtitle font: {}", path.display()),
        None => println!("[WARN] Subtitle font: none found (pass --sub-font or use --no-subs)"),
    }

    println!("     Config: {}", AppConfig::path().display());

    println!();
    if ffmpeg_ok && ffprobe_ok {
        println!("All required tools are available. beatcam is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg and make sure it is on PATH.");
    }

    Ok(())
}

fn report(ok: bool, what: &str) {
    if ok {
        println!("[OK] {what}");
    } else {
        println!("[MISSING] {what}");
    }
}
