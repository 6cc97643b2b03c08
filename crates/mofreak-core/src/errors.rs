use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the extraction pipeline. Per-video failures are
/// expected and reported; callers skip the video and move on.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("frame source ended after {got} frames; {needed} are needed to prime differencing")]
    PrematureEndOfStream { got: usize, needed: usize },

    #[error("failed to write feature file {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExtractionError>;
