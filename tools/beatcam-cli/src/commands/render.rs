//! Render a video with a camera script.

use std::io::Write;

use beatcam_common::config::AppConfig;
use beatcam_render_engine::{render_video, DurationMode, RenderJob, RenderOptions, RenderProgress, RenderStage};

use crate::RenderArgs;

pub async fn run(args: RenderArgs, config: &AppConfig) -> anyhow::Result<()> {
    let script = super::load_script(&args.script)?;
    let options = render_options(&args, config);

    println!("Rendering {}", args.input.display());
    println!("  Script: {} ({} beats)", args.script.display(), script.len());
    println!("  Output: {}", args.output.display());
    match options.duration {
        DurationMode::Fixed(secs) => println!("  Duration: {secs}s"),
        DurationMode::MatchSource => println!("  Duration: match source"),
    }
    println!(
        "  Subtitles: {}{}",
        if options.burn_subtitles { "burned-in" } else { "off" },
        if options.write_srt { " + .srt track" } else { "" }
    );

    let job = RenderJob {
        input: args.input,
        script,
        output: args.output,
        options,
    };

    let progress_cb: Box<dyn Fn(RenderProgress) + Send> = Box::new(|p| match p.stage {
        RenderStage::Rendering | RenderStage::Encoding => {
            print!(
                "\r  {}: {:.1}% ({}/{} frames{}, ETA: {:.0}s)  ",
                p.stage.as_str(),
                p.progress * 100.0,
                p.frames_done,
                p.total_frames,
                p.beat_id.map(|id| format!(", beat {id}")).unwrap_or_default(),
                p.eta_secs,
            );
            let _ = std::io::stdout().flush();
        }
        _ => {}
    });

    match render_video(job, Some(progress_cb)).await {
        Ok(summary) => {
            println!("\nRender complete: {}", summary.output.display());
            println!(
                "  {}x{} @ {}fps, {} frames, {:.1} MB in {:.1}s",
                summary.plan.width,
                summary.plan.height,
                summary.plan.fps,
                summary.frames.frames,
                summary.output_bytes as f64 / 1e6,
                summary.elapsed_secs
            );
            if let Some(track) = &summary.subtitle_track {
                println!("  Subtitle track: {}", track.display());
            }
            Ok(())
        }
        Err(e) => {
            println!("\nRender failed: {e}");
            Err(e.into())
        }
    }
}

/// Config defaults overridden by this run's flags.
fn render_options(args: &RenderArgs, config: &AppConfig) -> RenderOptions {
    let mut options = RenderOptions::from_config(config);
    options.fps = args.fps;
    if args.match_source_duration {
        options.duration = DurationMode::MatchSource;
    } else if let Some(secs) = args.duration {
        options.duration = DurationMode::Fixed(secs);
    }
    options.burn_subtitles &= !args.no_subs;
    options.write_srt = args.srt;
    if let Some(size) = args.sub_size {
        options.style.font_size = size;
    }
    if let Some(opacity) = args.sub_opacity {
        options.style.opacity = opacity;
    }
    if args.sub_font.is_some() {
        options.font = args.sub_font.clone();
    }
    options.write_report = args.report;
    options
}
