use image::GrayImage;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::detect::Keypoint;
use crate::img::{clamped_square_roi, resample_to_grid, IntegralImage};
use crate::mip::{motion_interchange_pattern, GATE_CENTER};

/// Per-frame context shared by every gate evaluation: the two frames being
/// differenced and the integral image of their difference.
pub struct GateContext<'a> {
    pub current: &'a GrayImage,
    pub previous: &'a GrayImage,
    pub diff_integral: &'a IntegralImage,
}

/// Outcome of a sufficiency test: the accept decision plus the raw motion
/// energy it was based on, kept for downstream use.
#[derive(Debug, Clone, Copy)]
pub struct GateDecision {
    pub accepted: bool,
    pub energy: u64,
}

/// Decides whether a keypoint carries enough motion to be worth encoding.
pub trait MotionGate {
    fn evaluate(&self, keypoint: &Keypoint, ctx: &GateContext<'_>) -> GateDecision;
}

/// Gate variant selection, part of the run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateKind {
    /// Direct MIP evaluation at the keypoint center, accepting when at
    /// least `min_bits` direction bits are set.
    KeypointMip { min_bits: u32 },
    /// O(1) summed-difference test over the integral image.
    IntegralSum,
}

impl Default for GateKind {
    fn default() -> Self {
        // Matches the reference pipeline, which gates on the center MIP.
        GateKind::KeypointMip { min_bits: 0 }
    }
}

impl GateKind {
    pub fn build(&self) -> Box<dyn MotionGate> {
        match *self {
            GateKind::KeypointMip { min_bits } => Box::new(KeypointMipGate::new(min_bits)),
            GateKind::IntegralSum => Box::new(IntegralSumGate),
        }
    }
}

/// Sufficiency test that resamples the keypoint ROI to the canonical grid
/// and evaluates a single MIP at its exact center.
///
/// The historical policy accepts everything (`min_bits == 0`); the bit
/// count stays configurable because the effective policy is an open
/// parameter of the algorithm.
#[derive(Debug, Clone, Copy)]
pub struct KeypointMipGate {
    min_bits: u32,
}

impl KeypointMipGate {
    pub fn new(min_bits: u32) -> Self {
        Self { min_bits }
    }
}

impl Default for KeypointMipGate {
    fn default() -> Self {
        Self::new(0)
    }
}

impl MotionGate for KeypointMipGate {
    fn evaluate(&self, keypoint: &Keypoint, ctx: &GateContext<'_>) -> GateDecision {
        let x = keypoint.position.x;
        let y = keypoint.position.y;

        let current_grid = resample_to_grid(&clamped_square_roi(ctx.current, x, y, keypoint.scale));
        let previous_grid =
            resample_to_grid(&clamped_square_roi(ctx.previous, x, y, keypoint.scale));

        let descriptor =
            motion_interchange_pattern(&current_grid, &previous_grid, GATE_CENTER.0, GATE_CENTER.1);
        let bits = descriptor.count_ones();

        trace!("keypoint mip gate at ({x:.1}, {y:.1}): {bits} bits set");
        GateDecision {
            accepted: bits >= self.min_bits,
            energy: bits as u64,
        }
    }
}

/// Sufficiency test that sums the difference image inside the keypoint's
/// box via the integral image and compares against `4 * radius * 5`.
///
/// Corner indices carry the +1 offset of the integral image's zero
/// padding; clipping keeps border keypoints valid with a smaller box.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegralSumGate;

impl MotionGate for IntegralSumGate {
    fn evaluate(&self, keypoint: &Keypoint, ctx: &GateContext<'_>) -> GateDecision {
        let radius = keypoint.scale.ceil() as i64;
        let threshold = (4 * radius * 5) as u64;

        let x = keypoint.position.x as i64;
        let y = keypoint.position.y as i64;
        let energy = ctx.diff_integral.clamped_box_sum(
            x - radius + 1,
            y - radius + 1,
            x + radius + 1,
            y + radius + 1,
        );

        trace!("integral gate at ({x}, {y}) r={radius}: energy {energy} vs {threshold}");
        GateDecision {
            accepted: energy > threshold,
            energy,
        }
    }
}
