pub mod check;
pub mod info;
pub mod path;
pub mod render;
pub mod subtitles;
pub mod validate;

use std::path::Path;

use beatcam_script_model::script::CameraScript;

/// Load and validate a camera script for a command.
pub fn load_script(path: &Path) -> anyhow::Result<CameraScript> {
    CameraScript::load_validated(path)
        .map_err(|e| anyhow::anyhow!("Failed to load camera script: {e}"))
}
