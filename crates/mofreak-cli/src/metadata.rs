use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use mofreak_core::VideoMetadata;
use serde::{Deserialize, Serialize};

/// Supported dataset layouts. Each selects a directory convention and a
/// class count; the descriptor pipeline itself is dataset-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dataset {
    Kth,
    Trecvid,
    Hollywood,
    Uti1,
    Uti2,
    Hmdb51,
    Ucf101,
}

impl Dataset {
    pub fn class_count(&self) -> usize {
        match self {
            Dataset::Kth => 6,
            Dataset::Trecvid => 7,
            Dataset::Hollywood => 12,
            Dataset::Uti1 | Dataset::Uti2 => 6,
            Dataset::Hmdb51 => 51,
            Dataset::Ucf101 => 101,
        }
    }

    /// Whether videos live in one subdirectory per action rather than a
    /// flat directory with self-describing filenames.
    pub fn uses_action_directories(&self) -> bool {
        matches!(self, Dataset::Hmdb51 | Dataset::Ucf101 | Dataset::Hollywood)
    }
}

/// KTH action vocabulary, in class-index order.
const KTH_ACTIONS: [&str; 6] = [
    "boxing",
    "handclapping",
    "handwaving",
    "jogging",
    "running",
    "walking",
];

/// Resolves (action, person, video number) from a video's path.
///
/// Flat datasets (KTH, UTI) encode everything in the filename; directory
/// datasets carry the action as the parent folder name, mapped to a stable
/// index in first-seen order.
pub struct MetadataResolver {
    dataset: Dataset,
    action_indices: BTreeMap<String, i32>,
}

impl MetadataResolver {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            action_indices: BTreeMap::new(),
        }
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn resolve(&mut self, video_path: &Path, action_dir: Option<&str>) -> VideoMetadata {
        match self.dataset {
            Dataset::Kth => self.resolve_kth(video_path),
            _ => self.resolve_generic(video_path, action_dir),
        }
    }

    /// KTH filenames follow `person{P}_{action}_d{N}_uncomp.avi`.
    fn resolve_kth(&self, video_path: &Path) -> VideoMetadata {
        let stem = file_stem(video_path);
        let parts: Vec<&str> = stem.split('_').collect();

        let person = parts
            .first()
            .and_then(|p| p.strip_prefix("person"))
            .and_then(|digits| digits.parse::<i32>().ok());
        let action = parts
            .get(1)
            .and_then(|name| KTH_ACTIONS.iter().position(|a| a == name))
            .map(|idx| idx as i32);
        let video_number = parts
            .get(2)
            .and_then(|p| p.strip_prefix('d'))
            .and_then(|digits| digits.parse::<i32>().ok());

        if person.is_none() || action.is_none() {
            warn!(
                "{} does not follow the KTH naming convention; metadata defaults to zero",
                video_path.display()
            );
        }

        VideoMetadata {
            action: action.unwrap_or(0),
            person: person.unwrap_or(0),
            video_number: video_number.unwrap_or(0),
        }
    }

    fn resolve_generic(&mut self, video_path: &Path, action_dir: Option<&str>) -> VideoMetadata {
        let action = match action_dir {
            Some(name) => {
                let next_index = self.action_indices.len() as i32;
                *self
                    .action_indices
                    .entry(name.to_string())
                    .or_insert(next_index)
            }
            None => 0,
        };

        // A trailing digit group in the stem is treated as the clip number.
        let stem = file_stem(video_path);
        let digits: String = stem
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let video_number = digits.parse::<i32>().unwrap_or(0);

        VideoMetadata {
            action,
            person: 0,
            video_number,
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn kth_filenames_parse_to_metadata() {
        let mut resolver = MetadataResolver::new(Dataset::Kth);
        let meta = resolver.resolve(&PathBuf::from("person13_running_d2_uncomp.avi"), None);
        assert_eq!(meta.person, 13);
        assert_eq!(meta.action, 4);
        assert_eq!(meta.video_number, 2);
    }

    #[test]
    fn malformed_kth_names_default_to_zero() {
        let mut resolver = MetadataResolver::new(Dataset::Kth);
        let meta = resolver.resolve(&PathBuf::from("holiday_footage.avi"), None);
        assert_eq!((meta.action, meta.person, meta.video_number), (0, 0, 0));
    }

    #[test]
    fn action_directories_get_stable_indices() {
        let mut resolver = MetadataResolver::new(Dataset::Hmdb51);
        let a = resolver.resolve(&PathBuf::from("clip_7.avi"), Some("brush_hair"));
        let b = resolver.resolve(&PathBuf::from("clip_9.avi"), Some("cartwheel"));
        let c = resolver.resolve(&PathBuf::from("clip_3.avi"), Some("brush_hair"));

        assert_eq!(a.action, 0);
        assert_eq!(b.action, 1);
        assert_eq!(c.action, 0);
        assert_eq!(a.video_number, 7);
        assert_eq!(b.video_number, 9);
    }

    #[test]
    fn class_counts_per_dataset() {
        assert_eq!(Dataset::Kth.class_count(), 6);
        assert_eq!(Dataset::Ucf101.class_count(), 101);
        assert!(Dataset::Hmdb51.uses_action_directories());
        assert!(!Dataset::Kth.uses_action_directories());
    }
}
