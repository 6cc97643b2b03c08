use image::GrayImage;

use super::{AppearanceDescriptor, Keypoint};
use crate::img::bilinear_sample;

/// Seed for the shared sampling pattern; fixed so descriptors are
/// reproducible across runs and machines.
const PATTERN_SEED: u64 = 0x5EED_F0CA_CC1A_0001;

#[derive(Debug, Clone, Copy)]
pub struct BriefConfig {
    /// Descriptor width in bytes; eight intensity tests per byte.
    pub descriptor_bytes: usize,
}

impl Default for BriefConfig {
    fn default() -> Self {
        Self { descriptor_bytes: 8 }
    }
}

/// BRIEF-style binary appearance descriptor.
///
/// Each byte packs eight pairwise intensity comparisons drawn from a fixed
/// random pattern on the unit disc, scaled to the keypoint's patch radius
/// at sampling time. Width is configurable so the appearance byte budget
/// of the feature record stays a run parameter.
#[derive(Debug, Clone)]
pub struct BriefDescriptor {
    bytes: usize,
    pattern: Vec<((f32, f32), (f32, f32))>,
}

impl BriefDescriptor {
    pub fn new(config: BriefConfig) -> Self {
        let bytes = config.descriptor_bytes.max(1);
        let mut rng = XorShift64::new(PATTERN_SEED);
        let pattern = (0..bytes * 8)
            .map(|_| (random_disc_point(&mut rng), random_disc_point(&mut rng)))
            .collect();
        Self { bytes, pattern }
    }

    fn describe(&self, image: &GrayImage, keypoint: &Keypoint) -> Vec<u8> {
        let cx = keypoint.position.x;
        let cy = keypoint.position.y;
        let radius = (keypoint.scale / 2.0).max(1.0);

        let mut bytes = vec![0u8; self.bytes];
        for (i, &((ax, ay), (bx, by))) in self.pattern.iter().enumerate() {
            let va = bilinear_sample(image, cx + ax * radius, cy + ay * radius);
            let vb = bilinear_sample(image, cx + bx * radius, cy + by * radius);
            if va < vb {
                bytes[i / 8] |= 1 << (i & 7);
            }
        }
        bytes
    }
}

impl Default for BriefDescriptor {
    fn default() -> Self {
        Self::new(BriefConfig::default())
    }
}

impl AppearanceDescriptor for BriefDescriptor {
    fn descriptor_len(&self) -> usize {
        self.bytes
    }

    fn compute(&self, image: &GrayImage, keypoints: &[Keypoint]) -> Vec<Vec<u8>> {
        keypoints
            .iter()
            .map(|kp| self.describe(image, kp))
            .collect()
    }
}

fn random_disc_point(rng: &mut XorShift64) -> (f32, f32) {
    loop {
        let x = rng.next_f32() * 2.0 - 1.0;
        let y = rng.next_f32() * 2.0 - 1.0;
        if x * x + y * y <= 1.0 {
            return (x, y);
        }
    }
}

struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 7;
        x ^= x >> 9;
        x ^= x << 8;
        self.state = x;
        x
    }

    fn next_f32(&mut self) -> f32 {
        let bits = self.next_u64() >> 40;
        (bits as f32) / (1u64 << 24) as f32
    }
}
