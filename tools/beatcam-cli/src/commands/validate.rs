//! Validate a camera script.

use std::path::PathBuf;

use beatcam_script_model::script::CameraScript;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating script at: {}", path.display());

    let script =
        CameraScript::load(&path).map_err(|e| anyhow::anyhow!("Failed to load camera script: {e}"))?;

    println!("  Beats: {}", script.len());
    println!("  Spoken: {}", script.spoken_count());
    println!();
    for beat in script.beats() {
        let cam = &beat.camera;
        println!(
            "  {:<6} zoom {:>4.2}  focus ({:>5.1}, {:>5.1})  {:<12} {:.2}s  {}",
            beat.id,
            cam.zoom,
            cam.focus_x,
            cam.focus_y,
            cam.transition.as_str(),
            cam.duration,
            if beat.is_silent() { "(silent)" } else { beat.script.as_str() }
        );
    }

    match script.validate() {
        Ok(()) => {
            println!("\nScript is valid.");
            Ok(())
        }
        Err(e) => {
            println!("\nValidation failed: {e}");
            Err(e.into())
        }
    }
}
