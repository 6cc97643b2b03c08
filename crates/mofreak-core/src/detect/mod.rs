use image::GrayImage;
use nalgebra::Vector2;

pub mod brief;
pub mod fast;

pub use brief::{BriefConfig, BriefDescriptor};
pub use fast::{FastConfig, FastDetector};

/// A detected interest point: sub-pixel position plus the effective patch
/// diameter it was detected at.
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub position: Vector2<f32>,
    pub scale: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, scale: f32) -> Self {
        Self {
            position: Vector2::new(x, y),
            scale,
        }
    }
}

/// Keypoint detection over a single grayscale image. Detection order must
/// be stable for a given input.
pub trait KeypointDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Keypoint>;
}

/// Appearance description: one fixed-width byte vector per keypoint,
/// aligned by index with the input slice.
pub trait AppearanceDescriptor {
    /// Descriptor width in bytes; every returned vector has this length.
    fn descriptor_len(&self) -> usize;

    fn compute(&self, image: &GrayImage, keypoints: &[Keypoint]) -> Vec<Vec<u8>>;
}
