pub mod assemble;
pub mod descriptor;
pub mod detect;
pub mod errors;
pub mod gate;
pub mod img;
pub mod io;
pub mod mip;

pub use assemble::{
    ExtractorConfig, FeatureAssembler, FrameSource, MoFreakFeature, VideoMetadata, FRAME_GAP,
};
pub use descriptor::{extract_motion_descriptor, MOTION_DESCRIPTOR_LEN};
pub use detect::{
    AppearanceDescriptor, BriefConfig, BriefDescriptor, FastConfig, FastDetector, Keypoint,
    KeypointDetector,
};
pub use errors::ExtractionError;
pub use gate::{GateContext, GateDecision, GateKind, IntegralSumGate, KeypointMipGate, MotionGate};
pub use io::write_features;
