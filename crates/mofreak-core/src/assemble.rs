use std::collections::VecDeque;

use image::GrayImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::descriptor::{extract_motion_descriptor, MOTION_DESCRIPTOR_LEN};
use crate::detect::{AppearanceDescriptor, Keypoint, KeypointDetector};
use crate::errors::{ExtractionError, Result};
use crate::gate::{GateContext, GateKind, MotionGate};
use crate::img::{difference_image, IntegralImage};

/// Number of frames buffered before differencing begins. The first
/// comparison pairs the newest decoded frame with the frame this many
/// positions behind it.
pub const FRAME_GAP: usize = 5;

/// Yields grayscale frames in decode order; `None` signals end of stream.
/// Frames of one video must share dimensions.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<GrayImage>;
}

/// Dataset metadata stamped on every feature of a video, resolved
/// externally from the video's path.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoMetadata {
    pub action: i32,
    pub person: i32,
    pub video_number: i32,
}

/// Extraction parameters fixed for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub appearance_bytes: usize,
    pub motion_bytes: usize,
    pub gate: GateKind,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            appearance_bytes: 8,
            motion_bytes: MOTION_DESCRIPTOR_LEN,
            gate: GateKind::default(),
        }
    }
}

impl ExtractorConfig {
    /// The motion byte budget is bound to the MIP site layout; anything
    /// else is a configuration defect, caught before processing starts.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.motion_bytes != MOTION_DESCRIPTOR_LEN {
            return Err(format!(
                "motion_bytes must equal the number of MIP evaluation sites ({MOTION_DESCRIPTOR_LEN}), got {}",
                self.motion_bytes
            ));
        }
        if self.appearance_bytes == 0 {
            return Err("appearance_bytes must be positive".to_string());
        }
        Ok(())
    }
}

/// One persisted feature: appearance and motion signatures plus record
/// metadata. Immutable once built.
#[derive(Debug, Clone)]
pub struct MoFreakFeature {
    pub frame_number: u32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub appearance: Vec<u8>,
    pub motion: Vec<u8>,
    pub action: i32,
    pub person: i32,
    pub video_number: i32,
    /// Reserved fields, always zero in the current format.
    pub motion_x: i32,
    pub motion_y: i32,
}

impl MoFreakFeature {
    fn new(
        frame_number: u32,
        keypoint: &Keypoint,
        appearance: Vec<u8>,
        motion: Vec<u8>,
        metadata: VideoMetadata,
        config: &ExtractorConfig,
    ) -> Self {
        // Length mismatches indicate a logic defect, not bad input.
        assert_eq!(
            appearance.len(),
            config.appearance_bytes,
            "appearance descriptor width does not match the configured byte count"
        );
        assert_eq!(
            motion.len(),
            config.motion_bytes,
            "motion descriptor width does not match the configured byte count"
        );

        Self {
            frame_number,
            x: keypoint.position.x,
            y: keypoint.position.y,
            scale: keypoint.scale,
            appearance,
            motion,
            action: metadata.action,
            person: metadata.person,
            video_number: metadata.video_number,
            motion_x: 0,
            motion_y: 0,
        }
    }
}

/// Drives per-frame processing for one video at a time: primes the frame
/// FIFO, differences frames, gates keypoints, and accumulates the
/// per-video feature stream until it is flushed.
pub struct FeatureAssembler<D, A> {
    config: ExtractorConfig,
    detector: D,
    appearance: A,
    gate: Box<dyn MotionGate>,
    features: Vec<MoFreakFeature>,
}

impl<D, A> FeatureAssembler<D, A>
where
    D: KeypointDetector,
    A: AppearanceDescriptor,
{
    pub fn new(config: ExtractorConfig, detector: D, appearance: A) -> Self {
        assert_eq!(
            appearance.descriptor_len(),
            config.appearance_bytes,
            "appearance descriptor width does not match the configured byte count"
        );
        let gate = config.gate.build();
        Self {
            config,
            detector,
            appearance,
            gate,
            features: Vec::new(),
        }
    }

    /// Features accumulated so far, in detection order (frame-major, then
    /// keypoint order within each frame).
    pub fn features(&self) -> &[MoFreakFeature] {
        &self.features
    }

    /// Drops accumulated features, typically after a successful flush.
    pub fn clear(&mut self) {
        self.features.clear();
    }

    /// Consumes a frame source end to end and returns the number of
    /// features this video contributed.
    ///
    /// An exhausted source mid-video ends the loop without discarding
    /// features already accumulated; running out of frames during priming
    /// is an error because no comparison was ever possible.
    pub fn process_video<S: FrameSource>(
        &mut self,
        source: &mut S,
        metadata: VideoMetadata,
    ) -> Result<usize> {
        let mut fifo: VecDeque<GrayImage> = VecDeque::with_capacity(FRAME_GAP + 1);
        for got in 0..FRAME_GAP {
            let frame = source
                .next_frame()
                .ok_or(ExtractionError::PrematureEndOfStream {
                    got,
                    needed: FRAME_GAP,
                })?;
            fifo.push_back(frame);
        }
        let mut previous = fifo.pop_front().expect("fifo was just primed");

        let mut frame_number = (FRAME_GAP - 1) as u32;
        let produced_before = self.features.len();

        while let Some(current) = source.next_frame() {
            let diff = difference_image(&current, &previous);
            let diff_integral = IntegralImage::new(&diff);

            let keypoints = self.detector.detect(&diff);
            let descriptors = self.appearance.compute(&diff, &keypoints);
            assert_eq!(
                descriptors.len(),
                keypoints.len(),
                "appearance descriptors must align with keypoints by index"
            );

            let ctx = GateContext {
                current: &current,
                previous: &previous,
                diff_integral: &diff_integral,
            };

            let mut accepted = 0usize;
            for (keypoint, appearance) in keypoints.iter().zip(descriptors) {
                let decision = self.gate.evaluate(keypoint, &ctx);
                if !decision.accepted {
                    continue;
                }
                accepted += 1;

                let motion = extract_motion_descriptor(&current, &previous, keypoint);
                self.features.push(MoFreakFeature::new(
                    frame_number,
                    keypoint,
                    appearance,
                    motion.to_vec(),
                    metadata,
                    &self.config,
                ));
            }

            debug!(
                "frame {frame_number}: {} keypoints, {accepted} passed the motion gate",
                keypoints.len()
            );

            fifo.push_back(current);
            previous = fifo.pop_front().expect("fifo always holds a spare frame");
            frame_number += 1;
        }

        let produced = self.features.len() - produced_before;
        info!(
            "video complete: {} frames differenced, {produced} features",
            frame_number as usize + 1 - FRAME_GAP
        );
        Ok(produced)
    }
}
