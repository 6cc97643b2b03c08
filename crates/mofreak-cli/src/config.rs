use std::path::{Path, PathBuf};

use mofreak_core::{ExtractorConfig, GateKind, MOTION_DESCRIPTOR_LEN};
use serde::{Deserialize, Serialize};

use crate::errors::{DatasetError, Result};
use crate::metadata::Dataset;

/// One dataset run, loaded from YAML and fixed for the whole batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub dataset: Dataset,
    /// Directory holding the input videos (flat, or one folder per action).
    pub video_dir: PathBuf,
    /// Directory the `.mofreak` files are written under, mirroring any
    /// action folders.
    pub output_dir: PathBuf,
    #[serde(default = "default_appearance_bytes")]
    pub appearance_bytes: usize,
    #[serde(default = "default_motion_bytes")]
    pub motion_bytes: usize,
    #[serde(default)]
    pub gate: GateKind,
}

fn default_appearance_bytes() -> usize {
    8
}

fn default_motion_bytes() -> usize {
    MOTION_DESCRIPTOR_LEN
}

impl RunConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            DatasetError::InvalidConfig(format!(
                "failed to read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let config: RunConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.video_dir.is_dir() {
            return Err(DatasetError::InvalidConfig(format!(
                "video_dir {} is not a directory",
                self.video_dir.display()
            )));
        }
        self.extractor_config()
            .validate()
            .map_err(DatasetError::InvalidConfig)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            appearance_bytes: self.appearance_bytes,
            motion_bytes: self.motion_bytes,
            gate: self.gate,
        }
    }
}
