use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::mip::CANONICAL_GRID_EDGE;

/// Extracts the square ROI of side `ceil(scale)` whose top-left corner sits
/// at `(x - scale/2, y - scale/2)`, clamped to the frame.
///
/// Keypoints near the border yield a smaller window instead of failing;
/// the caller resamples to the canonical grid afterwards, so downstream
/// geometry is unaffected.
pub fn clamped_square_roi(frame: &GrayImage, x: f32, y: f32, scale: f32) -> GrayImage {
    let side = (scale.ceil() as i64).max(1);
    let half = (scale as i64) / 2;

    // Intersect the intended window with the frame; the window never
    // slides, it loses the rows and columns that fall outside.
    let tl_x = (x as i64 - half).clamp(0, frame.width() as i64 - 1);
    let tl_y = (y as i64 - half).clamp(0, frame.height() as i64 - 1);
    let br_x = (x as i64 - half + side).clamp(tl_x + 1, frame.width() as i64);
    let br_y = (y as i64 - half + side).clamp(tl_y + 1, frame.height() as i64);

    imageops::crop_imm(
        frame,
        tl_x as u32,
        tl_y as u32,
        (br_x - tl_x) as u32,
        (br_y - tl_y) as u32,
    )
    .to_image()
}

/// Resamples an ROI to the canonical 19x19 grid so the fixed sub-patch
/// geometry applies regardless of keypoint scale.
pub fn resample_to_grid(roi: &GrayImage) -> GrayImage {
    imageops::resize(
        roi,
        CANONICAL_GRID_EDGE,
        CANONICAL_GRID_EDGE,
        FilterType::Triangle,
    )
}

/// Bilinearly interpolated intensity at a sub-pixel position, zero outside
/// the frame.
pub fn bilinear_sample(img: &GrayImage, x: f32, y: f32) -> f32 {
    if x < 0.0 || y < 0.0 {
        return 0.0;
    }
    let w = img.width() as f32;
    let h = img.height() as f32;
    if x > w - 1.0 || y > h - 1.0 {
        return 0.0;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);

    let dx = x - x0 as f32;
    let dy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0)[0] as f32;
    let p10 = img.get_pixel(x1, y0)[0] as f32;
    let p01 = img.get_pixel(x0, y1)[0] as f32;
    let p11 = img.get_pixel(x1, y1)[0] as f32;

    let top = p00 + dx * (p10 - p00);
    let bot = p01 + dx * (p11 - p01);
    top + dy * (bot - top)
}
