//! Section colors matching the teleprompter UI.
//!
//! The first character of a beat id names its script section. Colors are
//! fixed for the life of the process; unknown sections fall back to
//! [`DEFAULT_SECTION_COLOR`].

/// An 8-bit RGB triple.
pub type Rgb8 = [u8; 3];

/// Section palette keyed by the first character of a beat id.
pub const SECTION_COLORS: [(char, Rgb8); 5] = [
    ('1', [0x81, 0x8c, 0xf8]), // indigo
    ('2', [0x34, 0xd3, 0x99]), // green
    ('3', [0xfb, 0x92, 0x3c]), // orange
    ('4', [0xf4, 0x72, 0xb6]), // pink
    ('5', [0x60, 0xa5, 0xfa]), // blue
];

/// Color for ids whose section is not in [`SECTION_COLORS`].
pub const DEFAULT_SECTION_COLOR: Rgb8 = [0xa7, 0x8b, 0xbf];

/// Look up the section color for a beat id.
pub fn section_color(beat_id: &str) -> Rgb8 {
    beat_id
        .chars()
        .next()
        .and_then(|section| {
            SECTION_COLORS
                .iter()
                .find(|(key, _)| *key == section)
                .map(|(_, color)| *color)
        })
        .unwrap_or(DEFAULT_SECTION_COLOR)
}
