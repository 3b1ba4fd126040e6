//! beatcam CLI: render scripted camera moves over screen recordings.
//!
//! Usage:
//!   beatcam render <INPUT> <SCRIPT> <OUTPUT>   Render the full pipeline
//!   beatcam subtitles <SCRIPT> <OUTPUT>        Write the subtitle track only
//!   beatcam validate <SCRIPT>                  Validate a camera script
//!   beatcam path <SCRIPT>                      Dump the compiled camera path
//!   beatcam info <INPUT>                       Show source video information
//!   beatcam check                              Check external tools and fonts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use beatcam_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "beatcam",
    about = "Replay teleprompter camera scripts over screen recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a video with the script's camera moves and captions
    Render(RenderArgs),

    /// Write the subtitle track for a script without rendering
    Subtitles {
        /// Camera script (JSON beat list)
        script: PathBuf,

        /// Output track (.srt or .vtt)
        output: PathBuf,

        /// Total duration the beats are spread over (seconds)
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Validate a camera script
    Validate {
        /// Camera script (JSON beat list)
        script: PathBuf,
    },

    /// Compile a script into its per-frame camera path
    Path {
        /// Camera script (JSON beat list)
        script: PathBuf,

        /// Output frame rate
        #[arg(long, default_value = "30")]
        fps: f64,

        /// Output duration (seconds)
        #[arg(long)]
        duration: Option<f64>,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show source video information
    Info {
        /// Source video
        input: PathBuf,
    },

    /// Check external tools and subtitle fonts
    Check,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Source screen recording
    pub input: PathBuf,

    /// Camera script (JSON beat list)
    pub script: PathBuf,

    /// Output video
    pub output: PathBuf,

    /// Output frame rate (default: source rate)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Output duration in seconds (default from config, 30)
    #[arg(long, conflicts_with = "match_source_duration")]
    pub duration: Option<f64>,

    /// Use the source video's length as the output duration
    #[arg(long)]
    pub match_source_duration: bool,

    /// Do not burn captions into the frames
    #[arg(long)]
    pub no_subs: bool,

    /// Also write an .srt track next to the output
    #[arg(long)]
    pub srt: bool,

    /// Caption font size in pixels
    #[arg(long)]
    pub sub_size: Option<f32>,

    /// Caption bar opacity [0.0, 1.0]
    #[arg(long)]
    pub sub_opacity: Option<f32>,

    /// Caption font (TrueType/OpenType)
    #[arg(long)]
    pub sub_font: Option<PathBuf>,

    /// Write <output>.render.json with a render summary
    #[arg(long)]
    pub report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // CLI flags override the configured logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    logging.json |= cli.log_json;
    beatcam_common::logging::init_logging(&logging);
    tracing::debug!(config = %AppConfig::path().display(), "Configuration loaded");

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &config).await,
        Commands::Subtitles {
            script,
            output,
            duration,
        } => commands::subtitles::run(script, output, duration, &config),
        Commands::Validate { script } => commands::validate::run(script),
        Commands::Path {
            script,
            fps,
            duration,
            output,
        } => commands::path::run(script, fps, duration, output, &config),
        Commands::Info { input } => commands::info::run(input, &config),
        Commands::Check => commands::check::run(&config),
    }
}
