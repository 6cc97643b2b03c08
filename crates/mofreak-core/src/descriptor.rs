use image::GrayImage;

use crate::detect::Keypoint;
use crate::img::{clamped_square_roi, resample_to_grid};
use crate::mip::{motion_interchange_pattern, DESCRIPTOR_CENTERS};

/// Motion descriptor width in bytes: one MIP byte per evaluation site.
pub const MOTION_DESCRIPTOR_LEN: usize = DESCRIPTOR_CENTERS.len();

/// Computes the N-byte motion descriptor for one keypoint.
///
/// Both frames are cropped to the keypoint's scale-sized window, resampled
/// to the canonical grid, and a motion interchange pattern is evaluated at
/// each of the eight fixed sub-patch centers. Pure function of its inputs.
pub fn extract_motion_descriptor(
    current: &GrayImage,
    previous: &GrayImage,
    keypoint: &Keypoint,
) -> [u8; MOTION_DESCRIPTOR_LEN] {
    let x = keypoint.position.x;
    let y = keypoint.position.y;

    let current_grid = resample_to_grid(&clamped_square_roi(current, x, y, keypoint.scale));
    let previous_grid = resample_to_grid(&clamped_square_roi(previous, x, y, keypoint.scale));

    let mut descriptor = [0u8; MOTION_DESCRIPTOR_LEN];
    for (byte, &(cx, cy)) in descriptor.iter_mut().zip(DESCRIPTOR_CENTERS.iter()) {
        *byte = motion_interchange_pattern(&current_grid, &previous_grid, cx, cy);
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn descriptor_length_is_scale_invariant() {
        let current = GrayImage::from_pixel(256, 256, Luma([200]));
        let previous = GrayImage::from_pixel(256, 256, Luma([20]));

        for scale in [4.0f32, 19.0, 50.0, 200.0] {
            let kp = Keypoint::new(128.0, 128.0, scale);
            let descriptor = extract_motion_descriptor(&current, &previous, &kp);
            assert_eq!(descriptor.len(), MOTION_DESCRIPTOR_LEN);
            // A 180-level uniform jump trips every direction bit.
            assert!(descriptor.iter().all(|&b| b == 0xFF));
        }
    }

    #[test]
    fn static_frames_yield_an_all_zero_descriptor() {
        let frame = GrayImage::from_pixel(64, 64, Luma([131]));
        let kp = Keypoint::new(30.0, 30.0, 19.0);
        let descriptor = extract_motion_descriptor(&frame, &frame, &kp);
        assert_eq!(descriptor, [0u8; MOTION_DESCRIPTOR_LEN]);
    }

    #[test]
    fn border_keypoints_degrade_gracefully() {
        let current = GrayImage::from_pixel(64, 64, Luma([255]));
        let previous = GrayImage::from_pixel(64, 64, Luma([0]));
        // Scale window hangs off every border; the clamped ROI still
        // resamples to the canonical grid.
        let kp = Keypoint::new(1.0, 63.0, 40.0);
        let descriptor = extract_motion_descriptor(&current, &previous, &kp);
        assert_eq!(descriptor.len(), MOTION_DESCRIPTOR_LEN);
        assert!(descriptor.iter().all(|&b| b == 0xFF));
    }
}
