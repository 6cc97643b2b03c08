use mofreak_core::ExtractionError;
use thiserror::Error;

/// Errors raised while driving a dataset run. Per-video errors are logged
/// and skipped so one bad file never aborts the batch.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not open video source {0}")]
    UnopenableSource(String),

    #[error("video decoding failed: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
