//! Per-frame crop/zoom transform.
//!
//! A frame is cropped to `(W / zoom, H / zoom)` around the focus point and
//! scaled back to `W x H`. The crop window is clamped inside the frame by
//! moving it, never by shrinking it.

use image::imageops::{self, FilterType};
use image::RgbImage;

use beatcam_script_model::camera::CameraState;

/// Resampling filter used to scale the crop back to full size.
pub const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

/// A crop window in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Whether this rect covers the whole `width x height` frame.
    pub fn is_full_frame(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

/// Compute the crop window for `camera` on a `width x height` frame.
///
/// Zoom below 1 would ask for a crop larger than the frame; it is clamped to
/// the full frame.
pub fn crop_rect(width: u32, height: u32, camera: &CameraState) -> CropRect {
    let (crop_w, x) = crop_axis(width, camera.zoom, camera.focus_x);
    let (crop_h, y) = crop_axis(height, camera.zoom, camera.focus_y);
    CropRect {
        x,
        y,
        width: crop_w,
        height: crop_h,
    }
}

fn crop_axis(extent: u32, zoom: f64, focus_pct: f64) -> (u32, u32) {
    if extent == 0 {
        return (0, 0);
    }
    let size = (extent as f64 / zoom).round();
    let size = if size.is_finite() {
        (size as u32).clamp(1, extent)
    } else {
        extent
    };

    let center = (focus_pct / 100.0 * extent as f64).round() as i64;
    let start = center - (size / 2) as i64;
    let start = start.clamp(0, (extent - size) as i64) as u32;
    (size, start)
}

/// Apply the crop/zoom for `camera`, returning a frame of the same size.
pub fn transform(frame: &RgbImage, camera: &CameraState) -> RgbImage {
    let (width, height) = frame.dimensions();
    let rect = crop_rect(width, height, camera);
    if rect.is_full_frame(width, height) {
        return frame.clone();
    }

    let cropped = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();
    imageops::resize(&cropped, width, height, RESAMPLE_FILTER)
}

/// Trim a frame to `width x height` from the top-left corner.
///
/// Used to force even output dimensions; a frame already at that size is
/// returned unchanged.
pub fn fit_to(frame: RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        return frame;
    }
    let width = width.min(frame.width());
    let height = height.min(frame.height());
    imageops::crop_imm(&frame, 0, 0, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_identity_crop_is_full_frame() {
        let rect = crop_rect(1920, 1080, &CameraState::FULL);
        assert_eq!(
            rect,
            CropRect {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080
            }
        );
        // Odd sizes must not lose a pixel to integer halving.
        assert!(crop_rect(1279, 719, &CameraState::FULL).is_full_frame(1279, 719));
    }

    #[test]
    fn test_identity_transform_returns_original() {
        let frame = gradient(64, 36);
        let out = transform(&frame, &CameraState::FULL);
        assert_eq!(out, frame);
    }

    #[test]
    fn test_zoom_two_centered() {
        let rect = crop_rect(1920, 1080, &CameraState::new(2.0, 50.0, 50.0));
        assert_eq!(
            rect,
            CropRect {
                x: 480,
                y: 270,
                width: 960,
                height: 540
            }
        );
    }

    #[test]
    fn test_crop_is_clamped_not_scaled() {
        let rect = crop_rect(1000, 500, &CameraState::new(2.0, 0.0, 100.0));
        assert_eq!((rect.width, rect.height), (500, 250));
        assert_eq!((rect.x, rect.y), (0, 250));

        let rect = crop_rect(1000, 500, &CameraState::new(4.0, 99.0, 1.0));
        assert_eq!((rect.width, rect.height), (250, 125));
        assert_eq!((rect.x, rect.y), (750, 0));
    }

    #[test]
    fn test_zoom_below_one_uses_full_frame() {
        let rect = crop_rect(640, 480, &CameraState::new(0.5, 20.0, 80.0));
        assert!(rect.is_full_frame(640, 480));
    }

    #[test]
    fn test_extreme_zoom_keeps_one_pixel() {
        let rect = crop_rect(100, 100, &CameraState::new(1e9, 50.0, 50.0));
        assert_eq!((rect.width, rect.height), (1, 1));
    }

    #[test]
    fn test_zoomed_transform_keeps_size() {
        let frame = gradient(80, 60);
        let out = transform(&frame, &CameraState::new(1.7, 30.0, 65.0));
        assert_eq!(out.dimensions(), (80, 60));
    }

    #[test]
    fn test_zoom_on_flat_region_stays_flat() {
        let mut frame = RgbImage::from_pixel(100, 100, Rgb([200, 10, 10]));
        for x in 0..50 {
            for y in 0..100 {
                frame.put_pixel(x, y, Rgb([10, 10, 200]));
            }
        }
        // Crop 25x25 around (85, 50) lies entirely in the red half.
        let out = transform(&frame, &CameraState::new(4.0, 85.0, 50.0));
        for pixel in out.pixels() {
            assert!(pixel.0[0] >= 199 && pixel.0[2] <= 11, "{pixel:?}");
        }
    }

    #[test]
    fn test_fit_to_trims_odd_dimensions() {
        let frame = gradient(101, 57);
        let out = fit_to(frame.clone(), 100, 56);
        assert_eq!(out.dimensions(), (100, 56));
        assert_eq!(out.get_pixel(99, 55), frame.get_pixel(99, 55));

        let same = fit_to(frame.clone(), 101, 57);
        assert_eq!(same, frame);
    }
}
