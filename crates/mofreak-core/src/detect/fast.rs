use image::GrayImage;
use log::{debug, trace};

use super::{Keypoint, KeypointDetector};

/// Bresenham circle of radius 3 used by the segment test, clockwise from
/// twelve o'clock.
const CIRCLE_OFFSETS: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const CIRCLE_RADIUS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct FastConfig {
    /// Minimum contrast between the center and a circle pixel for it to
    /// count as brighter/darker.
    pub intensity_threshold: i16,
    /// Contiguous arc length required for a corner (9 of 16 is the
    /// classic segment test).
    pub arc_length: usize,
    /// Hard cap on detections per frame, kept in score order.
    pub max_keypoints: usize,
    /// Patch diameter stamped on every keypoint; the descriptor stage
    /// resamples this window to its canonical grid.
    pub keypoint_scale: f32,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            intensity_threshold: 30,
            arc_length: 9,
            max_keypoints: 500,
            keypoint_scale: 9.0,
        }
    }
}

/// FAST-style segment-test corner detector.
///
/// Runs over the per-frame difference image, where moving structure shows
/// up as bright blobs on a near-zero background, so corner responses
/// cluster on motion boundaries.
#[derive(Debug, Clone)]
pub struct FastDetector {
    config: FastConfig,
}

impl FastDetector {
    pub fn new(config: FastConfig) -> Self {
        let mut config = config;
        config.arc_length = config.arc_length.clamp(1, 16);
        config.max_keypoints = config.max_keypoints.max(1);
        Self { config }
    }
}

impl Default for FastDetector {
    fn default() -> Self {
        Self::new(FastConfig::default())
    }
}

impl KeypointDetector for FastDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint> {
        let width = image.width();
        let height = image.height();
        if width <= CIRCLE_RADIUS * 2 || height <= CIRCLE_RADIUS * 2 {
            return Vec::new();
        }

        let mut score_map = vec![0.0f32; (width * height) as usize];
        let mut candidates: Vec<(u32, u32, f32)> = Vec::new();

        for y in CIRCLE_RADIUS..height - CIRCLE_RADIUS {
            for x in CIRCLE_RADIUS..width - CIRCLE_RADIUS {
                if let Some(score) = corner_score(
                    image,
                    x,
                    y,
                    self.config.intensity_threshold,
                    self.config.arc_length,
                ) {
                    score_map[(y * width + x) as usize] = score;
                    candidates.push((x, y, score));
                }
            }
        }
        trace!(
            "segment test found {} raw corners above contrast {}",
            candidates.len(),
            self.config.intensity_threshold
        );

        // 3x3 non-maximum suppression over the score map.
        let mut keypoints: Vec<(Keypoint, f32)> = Vec::new();
        for &(x, y, score) in &candidates {
            let mut is_max = true;
            'nms: for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    if (nx, ny) != (x, y) && score_map[(ny * width + nx) as usize] > score {
                        is_max = false;
                        break 'nms;
                    }
                }
            }
            if is_max {
                keypoints.push((
                    Keypoint::new(x as f32, y as f32, self.config.keypoint_scale),
                    score,
                ));
            }
        }

        keypoints.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        keypoints.truncate(self.config.max_keypoints);

        debug!(
            "fast detection in {}x{} -> {} keypoints (max {})",
            width,
            height,
            keypoints.len(),
            self.config.max_keypoints
        );
        keypoints.into_iter().map(|(kp, _)| kp).collect()
    }
}

fn corner_score(
    image: &GrayImage,
    x: u32,
    y: u32,
    threshold: i16,
    arc_length: usize,
) -> Option<f32> {
    let center = image.get_pixel(x, y)[0] as i32;
    let high = center + threshold as i32;
    let low = center - threshold as i32;

    let mut circle = [0i32; 16];
    for (i, &(dx, dy)) in CIRCLE_OFFSETS.iter().enumerate() {
        circle[i] = image.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32)[0] as i32;
    }

    // Quick reject on the four compass pixels. They sit 4 apart on the
    // circle, so a contiguous arc of length L is only guaranteed to cover
    // L / 4 of them; requiring more would discard genuine corners.
    let required = (arc_length / 4).max(1);
    let mut brighter = 0;
    let mut darker = 0;
    for &i in &[0usize, 4, 8, 12] {
        if circle[i] >= high {
            brighter += 1;
        } else if circle[i] <= low {
            darker += 1;
        }
    }
    if brighter < required && darker < required {
        return None;
    }

    // Wrap-around classification, doubled to catch arcs crossing index 0.
    let mut class = [0i8; 32];
    for i in 0..16 {
        class[i] = if circle[i] > high {
            1
        } else if circle[i] < low {
            -1
        } else {
            0
        };
        class[i + 16] = class[i];
    }

    let mut best = 0.0f32;
    let mut is_corner = false;
    let mut idx = 0usize;
    while idx < class.len() {
        let sign = class[idx];
        if sign == 0 {
            idx += 1;
            continue;
        }
        let mut len = 0usize;
        let mut contrast = 0.0f32;
        while idx + len < class.len() && class[idx + len] == sign {
            let v = circle[(idx + len) % 16];
            contrast += (v - center).abs() as f32;
            len += 1;
        }
        if len >= arc_length {
            is_corner = true;
            best = best.max(contrast);
        }
        idx += len;
    }

    is_corner.then_some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn detects_corners_of_a_bright_square() {
        let mut image = GrayImage::from_pixel(40, 40, Luma([0]));
        for y in 12..28 {
            for x in 12..28 {
                image.put_pixel(x, y, Luma([200]));
            }
        }

        let detector = FastDetector::default();
        let keypoints = detector.detect(&image);
        assert!(!keypoints.is_empty(), "expected corners on the square");

        // Every detection sits on the square's boundary region.
        for kp in &keypoints {
            let (x, y) = (kp.position.x, kp.position.y);
            assert!((10.0..=30.0).contains(&x) && (10.0..=30.0).contains(&y));
            assert_eq!(kp.scale, 9.0);
        }
    }

    #[test]
    fn square_corner_survives_the_compass_precheck() {
        // At the top-left pixel of a bright square only two compass
        // pixels (up and left) are darker, yet the wrap-around segment
        // test finds a darker arc well past 9 of 16. The pre-check must
        // not reject it first.
        let mut image = GrayImage::from_pixel(40, 40, Luma([0]));
        for y in 12..28 {
            for x in 12..28 {
                image.put_pixel(x, y, Luma([200]));
            }
        }

        let score = corner_score(&image, 12, 12, 30, 9);
        assert!(score.is_some(), "9-of-16 corner rejected by the pre-check");
    }

    #[test]
    fn flat_image_yields_nothing() {
        let image = GrayImage::from_pixel(32, 32, Luma([128]));
        assert!(FastDetector::default().detect(&image).is_empty());
    }

    #[test]
    fn detection_order_is_stable() {
        let mut image = GrayImage::from_pixel(48, 48, Luma([0]));
        for y in 8..20 {
            for x in 8..40 {
                image.put_pixel(x, y, Luma([180]));
            }
        }
        let detector = FastDetector::default();
        let a = detector.detect(&image);
        let b = detector.detect(&image);
        assert_eq!(a.len(), b.len());
        for (ka, kb) in a.iter().zip(&b) {
            assert_eq!(ka.position, kb.position);
        }
    }
}
