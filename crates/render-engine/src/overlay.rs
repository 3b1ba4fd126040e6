//! Burned-in caption overlay.
//!
//! Draws a bottom-third caption bar for the active beat: a translucent dark
//! bar blended over the frame, a section-colored accent stripe, the beat id
//! in small colored capitals, and the caption in near-white.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use beatcam_common::config::RenderDefaults;
use beatcam_common::error::{BeatcamError, BeatcamResult};
use beatcam_script_model::beat::Beat;

const PAD_X: i32 = 28;
const PAD_Y: u32 = 16;
const STRIPE_WIDTH: u32 = 6;
const LABEL_GAP: i32 = 14;
const LABEL_SCALE: f32 = 0.52;
/// Vertical center of the bar as a fraction of frame height.
const BAR_CENTER: f64 = 0.80;

const BAR_COLOR: Rgb<u8> = Rgb([15, 10, 12]);
const TEXT_COLOR: Rgb<u8> = Rgb([242, 245, 240]);

/// Fonts tried, in order, when none is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Caption appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubtitleStyle {
    /// Caption glyph height in pixels.
    pub font_size: f32,
    /// Bar background opacity [0.0, 1.0].
    pub opacity: f32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

impl From<&RenderDefaults> for SubtitleStyle {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            font_size: defaults.subtitle_font_size,
            opacity: defaults.subtitle_opacity,
        }
    }
}

impl SubtitleStyle {
    pub fn validate(&self) -> BeatcamResult<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(BeatcamError::config(format!(
                "Subtitle font size must be > 0, got {}",
                self.font_size
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(BeatcamError::config(format!(
                "Subtitle opacity must be within 0-1, got {}",
                self.opacity
            )));
        }
        Ok(())
    }
}

/// Pixel layout of a caption bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarLayout {
    pub bar_y: u32,
    pub bar_height: u32,
    pub label_x: i32,
    pub label_y: i32,
    pub text_x: i32,
    pub text_y: i32,
}

/// Place the bar for a caption `text_height` tall and a label `label_width`
/// by `label_height`.
///
/// The bar is centered at 80% of the frame height and pushed up (never
/// shrunk) so it ends at or above the bottom edge. A bar taller than the
/// frame is cut to the frame height.
pub fn bar_layout(
    frame_height: u32,
    text_height: u32,
    label_width: u32,
    label_height: u32,
) -> BarLayout {
    let bar_height = (text_height + PAD_Y * 2).min(frame_height);
    let nominal = (frame_height as f64 * BAR_CENTER) as i64 - (bar_height / 2) as i64;
    let bar_y = nominal.clamp(0, (frame_height - bar_height) as i64) as u32;

    let text_y = (bar_y + PAD_Y) as i32;
    BarLayout {
        bar_y,
        bar_height,
        label_x: PAD_X + 4,
        label_y: text_y + (text_height.saturating_sub(label_height) / 2) as i32,
        text_x: PAD_X + 4 + label_width as i32 + LABEL_GAP,
        text_y,
    }
}

/// Blend `color` over rows `[y, y + height)` of `frame` at `opacity`.
pub fn blend_band(frame: &mut RgbImage, y: u32, height: u32, color: Rgb<u8>, opacity: f32) {
    let alpha = opacity.clamp(0.0, 1.0);
    let end = (y + height).min(frame.height());
    for row in y..end {
        for x in 0..frame.width() {
            let pixel = frame.get_pixel_mut(x, row);
            for (channel, target) in pixel.0.iter_mut().zip(color.0) {
                let mixed = target as f32 * alpha + *channel as f32 * (1.0 - alpha);
                *channel = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Darken the bar region of `layout` and paint its left accent stripe.
pub fn draw_bar(frame: &mut RgbImage, layout: &BarLayout, accent: Rgb<u8>, opacity: f32) {
    if frame.width() == 0 || layout.bar_height == 0 {
        return;
    }
    blend_band(frame, layout.bar_y, layout.bar_height, BAR_COLOR, opacity);
    draw_filled_rect_mut(
        frame,
        Rect::at(0, layout.bar_y as i32).of_size(STRIPE_WIDTH.min(frame.width()), layout.bar_height),
        accent,
    );
}

/// Draws captions with a loaded font.
pub struct SubtitleRenderer {
    style: SubtitleStyle,
    font: FontVec,
}

impl SubtitleRenderer {
    pub fn new(style: SubtitleStyle, font: FontVec) -> BeatcamResult<Self> {
        style.validate()?;
        Ok(Self { style, font })
    }

    /// Load the font at `path` and build a renderer.
    pub fn from_font_path(style: SubtitleStyle, path: &Path) -> BeatcamResult<Self> {
        let font = load_font(path)?;
        tracing::debug!(font = %path.display(), size = style.font_size, "Subtitle font loaded");
        Self::new(style, font)
    }

    pub fn style(&self) -> &SubtitleStyle {
        &self.style
    }

    /// Compute the layout `beat`'s caption would use on `frame_height`.
    pub fn layout(&self, frame_height: u32, beat: &Beat) -> BarLayout {
        let label = beat.id.to_uppercase();
        let (_, text_height) = text_size(self.scale(), &self.font, &beat.script);
        let (label_width, label_height) = text_size(self.label_scale(), &self.font, &label);
        bar_layout(frame_height, text_height, label_width, label_height)
    }

    /// Draw `beat`'s caption onto `frame`. Silent beats are skipped.
    ///
    /// Returns whether anything was drawn.
    pub fn draw(&self, frame: &mut RgbImage, beat: &Beat) -> bool {
        if beat.is_silent() || frame.width() == 0 || frame.height() == 0 {
            return false;
        }

        let layout = self.layout(frame.height(), beat);
        let accent = Rgb(beat.section_color());

        draw_bar(frame, &layout, accent, self.style.opacity);
        draw_text_mut(
            frame,
            accent,
            layout.label_x,
            layout.label_y,
            self.label_scale(),
            &self.font,
            &beat.id.to_uppercase(),
        );
        draw_text_mut(
            frame,
            TEXT_COLOR,
            layout.text_x,
            layout.text_y,
            self.scale(),
            &self.font,
            &beat.script,
        );
        true
    }

    fn scale(&self) -> PxScale {
        PxScale::from(self.style.font_size)
    }

    fn label_scale(&self) -> PxScale {
        PxScale::from(self.style.font_size * LABEL_SCALE)
    }
}

/// Load a TrueType/OpenType font file.
pub fn load_font(path: &Path) -> BeatcamResult<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BeatcamError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => BeatcamError::config(format!("Cannot read font {}: {e}", path.display())),
    })?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| BeatcamError::config(format!("Invalid font {}: {e}", path.display())))
}

/// Resolve the caption font: `preferred` if it exists, else the first
/// installed entry of [`FONT_CANDIDATES`].
pub fn discover_font(preferred: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = preferred {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(font = %path.display(), "Configured subtitle font not found; searching system fonts");
    }

    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beatcam_script_model::beat::{CameraMove, Transition};

    fn beat(id: &str, script: &str) -> Beat {
        Beat {
            id: id.to_string(),
            script: script.to_string(),
            camera: CameraMove {
                zoom: 1.0,
                focus_x: 50.0,
                focus_y: 50.0,
                transition: Transition::Cut,
                duration: 0.0,
            },
        }
    }

    // Text rendering needs an installed font. Set BEATCAM_REQUIRE_FONTS to
    // turn a missing font into a failure instead of a skip.
    fn system_renderer(test: &str) -> Option<SubtitleRenderer> {
        let renderer = discover_font(None)
            .and_then(|path| SubtitleRenderer::from_font_path(SubtitleStyle::default(), &path).ok());
        if renderer.is_none() {
            assert!(
                std::env::var_os("BEATCAM_REQUIRE_FONTS").is_none(),
                "{test}: no usable font in FONT_CANDIDATES"
            );
            eprintln!("skipping {test}: no usable font in FONT_CANDIDATES");
        }
        renderer
    }

    #[test]
    fn test_layout_sits_at_bottom_third() {
        let layout = bar_layout(1080, 36, 40, 18);
        assert_eq!(layout.bar_height, 68);
        assert_eq!(layout.bar_y, 864 - 34);
        assert_eq!(layout.text_y, 830 + 16);
        assert_eq!(layout.text_x, 28 + 4 + 40 + 14);
        assert_eq!(layout.label_y, 846 + 9);
    }

    #[test]
    fn test_layout_is_clamped_inside_frame() {
        // Tall caption on a short frame: the bar is pushed up to end at the bottom.
        let layout = bar_layout(100, 60, 10, 10);
        assert_eq!(layout.bar_height, 92);
        assert_eq!(layout.bar_y, 8);
        assert!(layout.bar_y + layout.bar_height <= 100);

        // Taller than the frame: cut to fit.
        let layout = bar_layout(50, 200, 10, 10);
        assert_eq!((layout.bar_y, layout.bar_height), (0, 50));
    }

    #[test]
    fn test_blend_band_mixes_with_frame() {
        let mut frame = RgbImage::from_pixel(4, 4, Rgb([200, 200, 200]));
        blend_band(&mut frame, 1, 2, Rgb([0, 0, 0]), 0.75);
        assert_eq!(frame.get_pixel(0, 0).0, [200, 200, 200]);
        assert_eq!(frame.get_pixel(2, 1).0, [50, 50, 50]);
        assert_eq!(frame.get_pixel(3, 2).0, [50, 50, 50]);
        assert_eq!(frame.get_pixel(1, 3).0, [200, 200, 200]);
    }

    #[test]
    fn test_blend_band_zero_opacity_is_noop() {
        let original = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8 * 30, y as u8 * 30, 7]));
        let mut frame = original.clone();
        blend_band(&mut frame, 0, 8, BAR_COLOR, 0.0);
        assert_eq!(frame, original);
    }

    #[test]
    fn test_bar_darkens_band_and_paints_stripe() {
        let mut frame = RgbImage::from_pixel(64, 120, Rgb([200, 200, 200]));
        let layout = bar_layout(120, 8, 4, 4);
        assert_eq!((layout.bar_y, layout.bar_height), (76, 40));
        let accent = Rgb([0x34, 0xd3, 0x99]);
        draw_bar(&mut frame, &layout, accent, 0.75);

        assert_eq!(frame.get_pixel(0, 90).0, accent.0);
        assert_eq!(frame.get_pixel(STRIPE_WIDTH - 1, 90).0, accent.0);
        // 0.75 * 15 + 0.25 * 200 = 61.25
        assert_eq!(frame.get_pixel(STRIPE_WIDTH, 90).0[0], 61);
        assert_eq!(frame.get_pixel(63, 76).0[0], 61);
        assert_eq!(frame.get_pixel(63, 115).0[0], 61);
        assert_eq!(frame.get_pixel(32, 75).0, [200, 200, 200]);
        assert_eq!(frame.get_pixel(32, 116).0, [200, 200, 200]);
    }

    #[test]
    fn test_bar_on_narrow_frame_clips_stripe() {
        let mut frame = RgbImage::from_pixel(3, 10, Rgb([0, 0, 0]));
        let layout = bar_layout(10, 2, 1, 1);
        draw_bar(&mut frame, &layout, Rgb([255, 0, 0]), 1.0);
        assert_eq!(frame.get_pixel(2, layout.bar_y).0, [255, 0, 0]);
    }

    #[test]
    fn test_style_validation() {
        assert!(SubtitleStyle::default().validate().is_ok());
        let bad_opacity = SubtitleStyle {
            opacity: 1.5,
            ..SubtitleStyle::default()
        };
        assert!(bad_opacity.validate().is_err());
        let bad_size = SubtitleStyle {
            font_size: 0.0,
            ..SubtitleStyle::default()
        };
        assert!(bad_size.validate().is_err());
    }

    #[test]
    fn test_load_font_errors() {
        assert!(matches!(
            load_font(Path::new("/nonexistent/beatcam/font.ttf")),
            Err(BeatcamError::FileNotFound { .. })
        ));

        let dir = std::env::temp_dir().join("beatcam_test_load_font");
        std::fs::create_dir_all(&dir).unwrap();
        let junk = dir.join("junk.ttf");
        std::fs::write(&junk, b"not a font").unwrap();
        assert!(matches!(load_font(&junk), Err(BeatcamError::Config { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_silent_beat_is_not_drawn() {
        let Some(renderer) = system_renderer("test_silent_beat_is_not_drawn") else {
            return;
        };
        let original = RgbImage::from_pixel(320, 180, Rgb([90, 90, 90]));
        let mut frame = original.clone();
        assert!(!renderer.draw(&mut frame, &beat("1b", "[pause]")));
        assert_eq!(frame, original);
    }

    #[test]
    fn test_caption_draws_bar_stripe_and_text() {
        let Some(renderer) = system_renderer("test_caption_draws_bar_stripe_and_text") else {
            return;
        };
        let mut frame = RgbImage::from_pixel(640, 360, Rgb([200, 200, 200]));
        let caption = beat("2a", "Open the settings panel");
        assert!(renderer.draw(&mut frame, &caption));

        let layout = renderer.layout(360, &caption);
        assert!(layout.bar_y + layout.bar_height <= 360);
        // Accent stripe in the section color.
        assert_eq!(frame.get_pixel(2, layout.bar_y + 1).0, [0x34, 0xd3, 0x99]);
        // Untouched area above the bar.
        assert_eq!(frame.get_pixel(320, 10).0, [200, 200, 200]);
        // Bar region right of the text is darkened, not replaced.
        let darkened = frame.get_pixel(639, layout.bar_y + 1).0;
        assert!(darkened[0] < 200 && darkened[0] > 15);
    }
}
