use beatcam_processing_core::build_path;
use beatcam_script_model::script::CameraScript;

const DEMO_SCRIPT: &str = r#"[
  { "id": "1a", "script": "Welcome to the dashboard",
    "camera": { "zoom": 1.0, "focusX": 50, "focusY": 50, "transition": "CUT", "duration": 0 } },
  { "id": "1b", "script": "This is the sidebar",
    "camera": { "zoom": 1.6, "focusX": 32, "focusY": 41, "transition": "ease", "duration": 0.6 } },
  { "id": "2a", "script": "Open the settings panel",
    "camera": { "zoom": 2.2, "focusX": 71.5, "focusY": 28, "transition": "ease-in-out", "duration": 1.0 } },
  { "id": "2b", "script": "[let it load]",
    "camera": { "zoom": 2.2, "focusX": 71.5, "focusY": 28, "transition": "HOLD", "duration": 0 } },
  { "id": "3a", "script": "Pick a theme",
    "camera": { "zoom": 1.35, "focusX": 45, "focusY": 62.5, "transition": "ease-out", "duration": 0.8 } },
  { "id": "4a", "script": "Back to the overview",
    "camera": { "zoom": 1.0, "focusX": 50, "focusY": 50, "transition": "linear", "duration": 1.5 } },
  { "id": "5a", "script": "And save",
    "camera": { "zoom": 1.8, "focusX": 12, "focusY": 88, "transition": "ease-in", "duration": 0.4 } }
]"#;

fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[test]
fn demo_script_signature_is_stable() {
    let script = CameraScript::from_json(DEMO_SCRIPT).expect("demo script should parse");
    let path = build_path(script.beats(), 451, 29.97).expect("demo script should compile");

    let signature = path
        .iter()
        .map(|p| {
            format!(
                "{:.4}|{:.4}|{:.4}|{}",
                p.zoom, p.focus_x, p.focus_y, p.beat_index
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    assert_eq!(path.len(), 451);
    assert_eq!(fnv1a_64(&signature), 0xaa427ef9129254d5);
}

#[test]
fn demo_script_slice_boundaries() {
    let script = CameraScript::from_json(DEMO_SCRIPT).expect("demo script should parse");
    let path = build_path(script.beats(), 451, 29.97).expect("demo script should compile");

    // 451 / 7 = 64.43 frames per beat.
    assert_eq!(path.beat_index(63), Some(0));
    assert_eq!(path.beat_index(64), Some(1));
    assert_eq!(path.beat_index(129), Some(2));
    assert_eq!(path.beat_index(450), Some(6));

    // Beat 1b blends over round(0.6 * 29.97) = 18 frames starting at 64.
    let opening = path.get(64).unwrap();
    assert_eq!((opening.zoom, opening.focus_x, opening.focus_y), (1.0, 50.0, 50.0));
    let settled = path.get(84).unwrap();
    assert_eq!((settled.zoom, settled.focus_x, settled.focus_y), (1.6, 32.0, 41.0));
}
