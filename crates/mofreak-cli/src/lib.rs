pub mod config;
pub mod errors;
pub mod metadata;
pub mod video;

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use mofreak_core::{BriefConfig, BriefDescriptor, FastConfig, FastDetector, FeatureAssembler};

use crate::config::RunConfig;
use crate::errors::Result;
use crate::metadata::MetadataResolver;
use crate::video::{BufferedFrameSource, GrayVideoDecoder};

/// Totals for one batch run.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    pub videos_processed: usize,
    pub videos_skipped: usize,
    pub features_written: usize,
}

/// Walks a dataset directory and produces one `.mofreak` file per video.
///
/// Videos are independent units of work; any per-video failure is logged
/// and the batch moves on.
pub struct DatasetProcessor {
    config: RunConfig,
    resolver: MetadataResolver,
}

impl DatasetProcessor {
    pub fn new(config: RunConfig) -> Self {
        let resolver = MetadataResolver::new(config.dataset);
        Self { config, resolver }
    }

    pub fn run(&mut self) -> Result<BatchSummary> {
        GrayVideoDecoder::init()?;
        fs::create_dir_all(&self.config.output_dir)?;

        info!(
            "extracting MoFREAK features: videos in {}, output to {}",
            self.config.video_dir.display(),
            self.config.output_dir.display()
        );

        let mut summary = BatchSummary::default();
        let mut entries: Vec<_> = fs::read_dir(&self.config.video_dir)?
            .filter_map(|e| e.ok())
            .collect();
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                let action = entry.file_name().to_string_lossy().into_owned();
                debug!("entering action directory {action}");
                let action_out = self.config.output_dir.join(&action);
                fs::create_dir_all(&action_out)?;

                let mut videos: Vec<_> = fs::read_dir(&path)?.filter_map(|e| e.ok()).collect();
                videos.sort_by_key(|e| e.file_name());
                for video in videos {
                    let video_path = video.path();
                    if !is_video_file(&video_path) {
                        continue;
                    }
                    self.process_one(&video_path, Some(&action), &action_out, &mut summary);
                }
            } else if is_video_file(&path) {
                let output_dir = self.config.output_dir.clone();
                self.process_one(&path, None, &output_dir, &mut summary);
            }
        }

        info!(
            "batch complete: {} videos, {} skipped, {} features",
            summary.videos_processed, summary.videos_skipped, summary.features_written
        );
        Ok(summary)
    }

    fn process_one(
        &mut self,
        video_path: &Path,
        action_dir: Option<&str>,
        output_dir: &Path,
        summary: &mut BatchSummary,
    ) {
        match self.extract_video(video_path, action_dir, output_dir) {
            Ok(count) => {
                summary.videos_processed += 1;
                summary.features_written += count;
            }
            Err(e) => {
                warn!("skipping {}: {e}", video_path.display());
                summary.videos_skipped += 1;
            }
        }
    }

    fn extract_video(
        &mut self,
        video_path: &Path,
        action_dir: Option<&str>,
        output_dir: &Path,
    ) -> Result<usize> {
        info!("processing {}", video_path.display());

        let decoder = GrayVideoDecoder::open(video_path)?;
        let frames = decoder.decode_frames()?;
        let mut source = BufferedFrameSource::new(frames);

        let metadata = self.resolver.resolve(video_path, action_dir);
        let mut assembler = FeatureAssembler::new(
            self.config.extractor_config(),
            FastDetector::new(FastConfig::default()),
            BriefDescriptor::new(BriefConfig {
                descriptor_bytes: self.config.appearance_bytes,
            }),
        );

        let produced = assembler.process_video(&mut source, metadata)?;

        let file_name = format!(
            "{}.mofreak",
            video_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "video".to_string())
        );
        let destination = output_dir.join(file_name);
        mofreak_core::write_features(assembler.features(), &destination)?;
        assembler.clear();

        Ok(produced)
    }
}

fn is_video_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                ext == "avi" || ext == "mp4"
            })
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn video_extension_filter() {
        let dir = std::env::temp_dir().join("mofreak-ext-filter");
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["a.avi", "b.MP4", "notes.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        assert!(is_video_file(&dir.join("a.avi")));
        assert!(is_video_file(&dir.join("b.MP4")));
        assert!(!is_video_file(&dir.join("notes.txt")));
        assert!(!is_video_file(&PathBuf::from(
            "/definitely/not/there.avi"
        )));
    }
}
